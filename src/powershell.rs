//! PowerShell command encoders used as command decorators.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::warn;

/// Prefix of every encoded PowerShell invocation.
const POWERSHELL_PREFIX: &str =
    "powershell.exe -NonInteractive -NoProfile -ExecutionPolicy Bypass -EncodedCommand";

/// Encode a script the way `-EncodedCommand` expects: UTF-16LE, then base64.
pub fn encode_cmd(script: &str) -> String {
    let utf16: Vec<u8> = script
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    STANDARD.encode(utf16)
}

/// Wrap a script in a non-interactive `powershell.exe -EncodedCommand` call.
pub fn cmd(script: &str) -> String {
    format!("{} {}", POWERSHELL_PREFIX, encode_cmd(script))
}

/// Like [`cmd`] but for long scripts.
///
/// The script is gzipped and base64 encoded, and a short bootstrap that
/// decompresses and runs it is what gets passed to `powershell.exe`. This
/// keeps long scripts under the command line length limit.
///
/// If compression fails the script is wrapped uncompressed with [`cmd`].
pub fn compressed_cmd(script: &str) -> String {
    bootstrap_or_plain(script, gzip(script.as_bytes()))
}

/// Like [`compressed_cmd`] but reports a compression failure.
pub fn try_compressed_cmd(script: &str) -> io::Result<String> {
    gzip(script.as_bytes()).map(|compressed| cmd(&bootstrap(&compressed)))
}

fn bootstrap_or_plain(script: &str, compressed: io::Result<Vec<u8>>) -> String {
    match compressed {
        Ok(compressed) => cmd(&bootstrap(&compressed)),
        Err(e) => {
            warn!("failed to compress script, sending it uncompressed: {}", e);
            cmd(script)
        }
    }
}

fn bootstrap(compressed: &[u8]) -> String {
    let payload = STANDARD.encode(compressed);
    format!(
        "$s=New-Object IO.MemoryStream(,[Convert]::FromBase64String(\"{payload}\"));\
         $r=New-Object IO.StreamReader(New-Object IO.Compression.GzipStream($s,[IO.Compression.CompressionMode]::Decompress));\
         $c=$r.ReadToEnd();$r.Close();Invoke-Expression $c"
    )
}

fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}
