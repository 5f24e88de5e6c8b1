//! Shared PEM block iteration, grounded on the teacher's `rustls_pemfile`
//! usage in its CA-client module.

use rustls_pemfile::Item;

/// One decoded PEM block, tagged by what it parsed into.
pub enum Block {
	X509Certificate(Vec<u8>),
	Pkcs8Key(Vec<u8>),
	Sec1Key(Vec<u8>),
	Crl(Vec<u8>),
	Other,
}

/// Decodes every PEM block in `data`, in order. Non-fatal: blocks that
/// `rustls_pemfile` cannot parse are skipped rather than aborting the scan,
/// mirroring `pem.Decode`'s behavior of returning the remainder on failure.
pub fn iter_blocks(data: &[u8]) -> Vec<Block> {
	let mut reader = std::io::BufReader::new(data);
	let mut out = Vec::new();
	loop {
		match rustls_pemfile::read_one(&mut reader) {
			Ok(Some(item)) => out.push(match item {
				Item::X509Certificate(der) => Block::X509Certificate(der.to_vec()),
				Item::Pkcs8Key(der) => Block::Pkcs8Key(der.secret_pkcs8_der().to_vec()),
				Item::Sec1Key(der) => Block::Sec1Key(der.secret_sec1_der().to_vec()),
				Item::Crl(der) => Block::Crl(der.as_ref().to_vec()),
				_ => Block::Other,
			}),
			Ok(None) => break,
			Err(_) => break,
		}
	}
	out
}

/// Decodes the first PEM block only, regardless of type.
pub fn first_block(data: &[u8]) -> Option<Block> {
	iter_blocks(data).into_iter().next()
}
