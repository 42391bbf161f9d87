//! Basic Edit Chunking
//!
//! Parse a generated response, page through it, and fetch a later chunk the way a
//! separate request would.
//!
//! ```bash
//! cargo run --example basic_chunking
//! ```

use std::sync::Arc;

use editslabs::{
    cache_key, parse_edits, summarize_chunking, CacheConfig, ChunkStore, Coordinator,
    EditChunker, FileChunkStore,
};

fn main() {
    let mut response = String::from("I've updated the handlers and the config loader.\n\n");
    for (file, line, body) in [
        ("src/handlers.rs", 12, "fn get_user() {}"),
        ("src/config.rs", 3, "const PORT: u16 = 80;"),
        ("src/handlers.rs", 40, "fn delete_user() {}"),
    ] {
        response.push_str(&format!(
            "**FILE: {file}:{line}**\n```\nOLD:\n{body}\nNEW:\n{}\n```\n\n",
            body.replace("()", "(id: u64)").repeat(12)
        ));
    }

    let edits = parse_edits(&response);
    println!("Parsed {} edits\n", edits.len());

    // Deliberately small chunks so the demo pages
    let chunker = EditChunker::new(1_000);
    println!("{}\n", summarize_chunking(&chunker.chunk(&edits)));

    let dir = std::env::temp_dir().join("editslabs-demo");
    let store = Arc::new(FileChunkStore::new(CacheConfig::in_dir(&dir)));
    let coordinator = Coordinator::new(store.clone()).with_capacity(1_000);

    let prompt = "add ids to handlers, fix port";
    println!("{}\n", coordinator.process(&response, None, None, Some(prompt)));

    // A later, independent request only needs the key and an index.
    let key = cache_key(prompt).0;
    println!("{}\n", coordinator.fetch(&key, 2));

    let stats = store.stats();
    println!(
        "cache: {} entries in {} (ttl {:?}, max {})",
        stats.count, stats.location, stats.ttl, stats.max_entries
    );
}
