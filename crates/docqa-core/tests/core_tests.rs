use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docqa_core::chunker::{Chunker, ChunkingConfig};
use docqa_core::config::{AppConfig, HistoryPolicy};
use docqa_core::loader::CorpusLoader;
use docqa_core::types::Document;

#[test]
fn load_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let mut f = fs::File::create(dir.join("a.txt")).unwrap();
    writeln!(f, "Short text").unwrap();

    let docs = CorpusLoader::new(dir, "*.txt").unwrap().load().expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content.trim(), "Short text");
    assert!(docs[0].source.ends_with("a.txt"));
}

#[test]
fn document_count_equals_txt_file_count() {
    let tmp = TempDir::new().unwrap();
    for name in ["c.txt", "a.txt", "b.txt", "d.txt"] {
        fs::write(tmp.path().join(name), format!("contents of {name}")).unwrap();
    }

    let docs = CorpusLoader::new(tmp.path(), "*.txt").unwrap().load().expect("load");

    assert_eq!(docs.len(), 4);
    let names: Vec<String> = docs.iter().map(Document::doc_id).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "d.txt"], "sorted by path");
}

#[test]
fn non_matching_hidden_and_nested_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keep.txt"), "keep").unwrap();
    fs::write(tmp.path().join("skip.md"), "skip").unwrap();
    fs::write(tmp.path().join(".hidden.txt"), "hidden").unwrap();
    fs::create_dir(tmp.path().join("nested")).unwrap();
    fs::write(tmp.path().join("nested/inner.txt"), "inner").unwrap();

    let docs = CorpusLoader::new(tmp.path(), "*.txt").unwrap().load().expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content, "keep");
}

#[test]
fn missing_or_empty_directory_yields_nothing() {
    let tmp = TempDir::new().unwrap();
    let empty = CorpusLoader::new(tmp.path(), "*.txt").unwrap().load().expect("load");
    assert!(empty.is_empty());

    let missing = CorpusLoader::new(tmp.path().join("does-not-exist"), "*.txt").unwrap().load().expect("load");
    assert!(missing.is_empty());
}

#[test]
fn invalid_utf8_is_decoded_lossily() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bin.txt"), [b'o', b'k', 0xff, b'!']).unwrap();

    let docs = CorpusLoader::new(tmp.path(), "*.txt").unwrap().load().expect("load");

    assert_eq!(docs[0].content, "ok\u{fffd}!");
}

#[test]
fn chunking_is_deterministic_and_overlaps_by_exactly_200() {
    let text: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let doc = Document::new("long.txt", text);
    let chunker = Chunker::new(ChunkingConfig::default()).unwrap();

    let first = chunker.chunk(&doc);
    let second = chunker.chunk(&doc);
    assert_eq!(first, second);

    for chunk in &first {
        assert!(chunk.content.chars().count() <= 1000);
        assert_eq!(chunk.total_chunks, first.len());
    }
    for pair in first.windows(2) {
        let prev: Vec<char> = pair[0].content.chars().collect();
        let next: Vec<char> = pair[1].content.chars().collect();
        let tail: String = prev[prev.len() - 200..].iter().collect();
        let head: String = next[..200].iter().collect();
        assert_eq!(tail, head);
        assert_eq!(pair[1].start_char - pair[0].start_char, 800);
    }
    let last = first.last().unwrap();
    assert_eq!(last.start_char + last.content.chars().count(), 5000);
}

#[test]
fn config_defaults_match_the_pipeline_constants() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig::load_from(tmp.path(), "none").expect("defaults");
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert_eq!(config.corpus.glob, "*.txt");
    assert_eq!(config.openai.temperature, 0.0);
    assert_eq!(config.history.policy, HistoryPolicy::Discard);
}

#[test]
fn profile_file_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[corpus]\ndir = \"./docs\"\n[retrieval]\nk = 6\n[history]\npolicy = \"condense\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.prod.toml"), "[retrieval]\nk = 8\n").unwrap();

    let config = AppConfig::load_from(tmp.path(), "prod").expect("load");

    assert_eq!(config.corpus.dir, "./docs");
    assert_eq!(config.retrieval.k, 8);
    assert_eq!(config.history.policy, HistoryPolicy::Condense);
}

#[test]
fn invalid_chunking_is_rejected_at_load() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nchunk_size = 100\nchunk_overlap = 150\n").unwrap();

    assert!(AppConfig::load_from(tmp.path(), "none").is_err());
}
