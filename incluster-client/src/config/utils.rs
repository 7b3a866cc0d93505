use std::{fs, io, path::Path};

pub fn read_file<P: AsRef<Path>>(file: P) -> io::Result<Vec<u8>> {
    fs::read(file)
}

pub fn read_file_to_string<P: AsRef<Path>>(file: P) -> io::Result<String> {
    fs::read_to_string(file)
}

/// Extracts the DER contents of every `CERTIFICATE` block of a PEM bundle.
pub fn certs(data: &[u8]) -> Result<Vec<Vec<u8>>, pem::PemError> {
    Ok(pem::parse_many(data)?
        .into_iter()
        .filter_map(|p| {
            if p.tag() == "CERTIFICATE" {
                Some(p.into_contents())
            } else {
                None
            }
        })
        .collect::<Vec<_>>())
}
