use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use importer_core::ArchiveDigests;
use sha1::Sha1;
use sha2::{Digest, Sha256};

const CHUNK: usize = 64 * 1024;

/// SHA-256, SHA-1 and MD5 of a file, computed in one pass.
pub fn archive_digests(path: &Path) -> io::Result<ArchiveDigests> {
    let mut sha256 = Sha256::new();
    let mut sha1 = Sha1::new();
    let mut md5 = md5::Context::new();
    for_each_chunk(path, |chunk| {
        sha256.update(chunk);
        sha1.update(chunk);
        md5.consume(chunk);
    })?;

    Ok(ArchiveDigests {
        sha256: hex::encode(sha256.finalize()),
        sha1: hex::encode(sha1.finalize()),
        md5: format!("{:x}", md5.compute()),
    })
}

pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut md5 = md5::Context::new();
    for_each_chunk(path, |chunk| md5.consume(chunk))?;
    Ok(format!("{:x}", md5.compute()))
}

fn for_each_chunk(path: &Path, mut consume: impl FnMut(&[u8])) -> io::Result<()> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; CHUNK];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            return Ok(());
        }
        consume(&buffer[..read]);
    }
}
