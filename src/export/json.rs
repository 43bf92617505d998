use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::artifact::{DnsNameMapping, NetworkConnection, NetworkFile, NetworkHash, VoipCallPresentation};
use crate::error::ExportError;

use super::Exporter;

static UNSAFE_NAME_CHARS: OnceLock<Regex> = OnceLock::new();

/// Replaces everything but `[A-Za-z0-9_-]` so names are safe as file names.
fn sanitize(name: &str) -> String {
    let re = UNSAFE_NAME_CHARS.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex is valid"));
    let cleaned = re.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Sanitized name plus a digest of the raw text, so distinct raw names that
/// sanitize alike still map to distinct files.
fn unique_stem(raw: &str) -> String {
    let digest = blake3::hash(raw.as_bytes()).to_hex();
    format!("{}_{}", sanitize(raw), &digest.as_str()[..8])
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| ExportError::io(path, e))
}

fn ensure_dir(path: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(path).map_err(|e| ExportError::io(path, e))
}

#[derive(Serialize)]
struct NetworkMap<'a> {
    nodes: BTreeSet<&'a str>,
    edges: Vec<&'a NetworkConnection>,
}

/// Writes exports as JSON documents and plain files.
///
/// Layout under the output directory:
///
/// ```text
/// network_map.json
/// hashes/<hash type>_<digest>.txt
/// files/<content digest>_<name>.<ext>
/// dns_mappings.json
/// voip_calls/<call id>_<digest>.json
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl JsonExporter {
    /// Create a new exporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// File stem used for a hash type or call id.
    ///
    /// ```
    /// use netcarve::JsonExporter;
    ///
    /// assert!(JsonExporter::file_stem("abc@pbx").starts_with("abc_pbx_"));
    /// assert_ne!(JsonExporter::file_stem("abc@pbx"), JsonExporter::file_stem("abc.pbx"));
    /// ```
    #[must_use]
    pub fn file_stem(raw: &str) -> String {
        unique_stem(raw)
    }
}

impl Exporter for JsonExporter {
    fn export_network_map(&self, out_dir: &Path, connections: &[NetworkConnection]) -> Result<PathBuf, ExportError> {
        let mut edges: Vec<&NetworkConnection> = connections.iter().collect();
        edges.sort_by(|a, b| {
            (&a.source, &a.destination, a.src_port, a.dest_port, &a.protocol)
                .cmp(&(&b.source, &b.destination, b.src_port, b.dest_port, &b.protocol))
        });
        let nodes = connections
            .iter()
            .flat_map(|c| [c.source.as_str(), c.destination.as_str()])
            .collect();

        let path = out_dir.join("network_map.json");
        write_json(&path, &NetworkMap { nodes, edges })?;
        Ok(path)
    }

    fn export_hashes(&self, out_dir: &Path, hashes: &[NetworkHash]) -> Result<PathBuf, ExportError> {
        let dir = out_dir.join("hashes");
        ensure_dir(&dir)?;

        let mut by_type: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for h in hashes {
            by_type
                .entry(h.hash_type.as_str())
                .or_default()
                .insert(format!("{}:{}", h.username, h.hash));
        }

        for (hash_type, lines) in by_type {
            let path = dir.join(format!("{}.txt", unique_stem(hash_type)));
            let file = File::create(&path).map_err(|e| ExportError::io(&path, e))?;
            let mut writer = BufWriter::new(file);
            for line in lines {
                writeln!(writer, "{line}").map_err(|e| ExportError::io(&path, e))?;
            }
            writer.flush().map_err(|e| ExportError::io(&path, e))?;
        }
        Ok(dir)
    }

    fn export_files(&self, out_dir: &Path, files: &[NetworkFile]) -> Result<PathBuf, ExportError> {
        let dir = out_dir.join("files");
        ensure_dir(&dir)?;

        for f in files {
            let digest = blake3::hash(&f.data).to_hex();
            let mut name = format!("{}_{}", &digest.as_str()[..12], sanitize(&f.name));
            if !f.extension.is_empty() {
                name.push('.');
                name.push_str(&sanitize(&f.extension));
            }
            let path = dir.join(name);
            fs::write(&path, &f.data).map_err(|e| ExportError::io(&path, e))?;
        }
        Ok(dir)
    }

    fn export_dns_mappings(&self, out_dir: &Path, mappings: &[DnsNameMapping]) -> Result<PathBuf, ExportError> {
        let mut sorted: Vec<&DnsNameMapping> = mappings.iter().collect();
        sorted.sort_by(|a, b| (&a.query, &a.destination).cmp(&(&b.query, &b.destination)));

        let path = out_dir.join("dns_mappings.json");
        write_json(&path, &sorted)?;
        Ok(path)
    }

    fn export_voip_calls(&self, out_dir: &Path, calls: &[VoipCallPresentation]) -> Result<PathBuf, ExportError> {
        let dir = out_dir.join("voip_calls");
        ensure_dir(&dir)?;

        for call in calls {
            let path = dir.join(format!("{}.json", unique_stem(call.id.as_str())));
            write_json(&path, call)?;
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::artifact::VoipCall;

    fn conn(src: &str, dst: &str, port: u16) -> NetworkConnection {
        NetworkConnection {
            source: src.to_string(),
            destination: dst.to_string(),
            src_port: 40000,
            dest_port: port,
            protocol: "TCP".to_string(),
        }
    }

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize("report final.pdf"), "report_final_pdf");
        assert_eq!(sanitize("..."), "unnamed");
    }

    #[test]
    fn network_map_lists_nodes_and_edges() {
        let dir = tempfile::tempdir().unwrap();
        let conns = vec![conn("10.0.0.2", "10.0.0.1", 80), conn("10.0.0.1", "10.0.0.3", 443)];

        let path = JsonExporter::new().export_network_map(dir.path(), &conns).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["edges"].as_array().unwrap().len(), 2);
        assert_eq!(json["edges"][0]["source"], "10.0.0.1");
    }

    #[test]
    fn hashes_are_grouped_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let mk = |ty: &str, user: &str| NetworkHash {
            source: "s".to_string(),
            destination: "d".to_string(),
            protocol: "SMB".to_string(),
            hash_type: ty.to_string(),
            username: user.to_string(),
            hash: "00ff".to_string(),
        };
        let hashes = vec![mk("NTLMv2", "alice"), mk("NTLMv2", "bob"), mk("Kerberos V5", "svc")];

        let out = JsonExporter::new().export_hashes(dir.path(), &hashes).unwrap();
        let ntlm = fs::read_to_string(out.join(format!("{}.txt", unique_stem("NTLMv2")))).unwrap();
        assert_eq!(ntlm, "alice:00ff\nbob:00ff\n");
        assert!(unique_stem("Kerberos V5").starts_with("Kerberos_V5_"));
        assert!(out.join(format!("{}.txt", unique_stem("Kerberos V5"))).exists());
    }

    #[test]
    fn files_are_written_with_digest_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let file = NetworkFile {
            source: "s".to_string(),
            destination: "d".to_string(),
            protocol: "HTTP".to_string(),
            extension: "txt".to_string(),
            name: "notes".to_string(),
            data: b"hello".to_vec(),
        };

        let out = JsonExporter::new().export_files(dir.path(), &[file]).unwrap();
        let entries: Vec<_> = fs::read_dir(&out).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(entries.len(), 1);

        let name = entries[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_notes.txt"));
        assert_eq!(fs::read(&entries[0]).unwrap(), b"hello");
    }

    #[test]
    fn calls_get_one_document_each() {
        let dir = tempfile::tempdir().unwrap();
        let calls = vec![
            VoipCallPresentation::from_call(&VoipCall::new("abc@10.0.0.1", "a", "b")),
            VoipCallPresentation::from_call(&VoipCall::new("def", "c", "d")),
        ];

        let out = JsonExporter::new().export_voip_calls(dir.path(), &calls).unwrap();
        assert!(out.join(format!("{}.json", unique_stem("abc@10.0.0.1"))).exists());
        assert!(out.join(format!("{}.json", unique_stem("def"))).exists());
    }

    #[test]
    fn call_ids_that_sanitize_alike_get_separate_documents() {
        let dir = tempfile::tempdir().unwrap();
        let calls = vec![
            VoipCallPresentation::from_call(&VoipCall::new("abc@pbx", "a", "b")),
            VoipCallPresentation::from_call(&VoipCall::new("abc.pbx", "c", "d")),
        ];
        assert_eq!(sanitize("abc@pbx"), sanitize("abc.pbx"));

        let out = JsonExporter::new().export_voip_calls(dir.path(), &calls).unwrap();
        assert_eq!(fs::read_dir(&out).unwrap().count(), 2);

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(format!("{}.json", unique_stem("abc.pbx")))).unwrap())
                .unwrap();
        assert_eq!(doc["id"], "abc.pbx");
    }

    #[test]
    fn hash_types_that_sanitize_alike_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let mk = |ty: &str, user: &str| NetworkHash {
            source: "s".to_string(),
            destination: "d".to_string(),
            protocol: "SMB".to_string(),
            hash_type: ty.to_string(),
            username: user.to_string(),
            hash: "00ff".to_string(),
        };
        let hashes = vec![mk("NTLM v2", "alice"), mk("NTLM_v2", "bob")];

        let out = JsonExporter::new().export_hashes(dir.path(), &hashes).unwrap();
        assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
        let spaced = fs::read_to_string(out.join(format!("{}.txt", unique_stem("NTLM v2")))).unwrap();
        assert_eq!(spaced, "alice:00ff\n");
    }

    #[test]
    fn dns_mappings_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mappings = vec![
            DnsNameMapping { query: "b.com".to_string(), destination: "2.2.2.2".to_string() },
            DnsNameMapping { query: "a.com".to_string(), destination: "1.1.1.1".to_string() },
        ];

        let path = JsonExporter::new().export_dns_mappings(dir.path(), &mappings).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json[0]["query"], "a.com");
    }
}
