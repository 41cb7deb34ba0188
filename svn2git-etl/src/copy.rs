//! Byte-exact file copy into the staged working tree.

use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Copy `src` to `dst` verbatim and flush it to disk.
///
/// No line-ending or encoding conversion takes place. Permission bits are
/// carried over so executable scripts stay executable in the commit. `dst`'s
/// parent directory must already exist.
///
/// Returns the number of bytes copied.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let permissions = input.metadata()?.permissions();
    let mut output = File::create(dst)?;
    let copied = io::copy(&mut input, &mut output)?;
    output.sync_all()?;
    drop(output);
    fs::set_permissions(dst, permissions)?;
    Ok(copied)
}
