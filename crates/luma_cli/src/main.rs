//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `luma_core` linkage, library hydration and one gateway call.
//! - Keep output deterministic for quick local sanity checks.

use luma_core::{
    build_gateway, CoreConfig, LibraryStore, ScanOutcome, ScanSession, SqliteLocalStorage,
};
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    println!("luma_core ping={}", luma_core::ping());
    println!("luma_core version={}", luma_core::core_version());

    let storage = match SqliteLocalStorage::in_memory() {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("storage open failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut store = LibraryStore::new(storage);
    match store.load() {
        Ok(source) => println!(
            "library source={source:?} seeded={} hydrated={} count={}",
            source.is_seed(),
            store.is_hydrated(),
            store.len()
        ),
        Err(err) => {
            eprintln!("library load failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    let config = CoreConfig {
        api_key: None,
        mock_delay: Duration::ZERO,
        ..CoreConfig::from_env()
    };
    let gateway = match build_gateway(&config) {
        Ok(gateway) => gateway,
        Err(err) => {
            eprintln!("gateway init failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("gateway backend={:?}", gateway.backend());

    let session = ScanSession::open(gateway, config.locale);
    match session.search("Dune").await {
        ScanOutcome::Navigate(request) => {
            println!(
                "search outcome=navigate id_prefix_ok={}",
                request.route_id.starts_with("search-")
            );
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("search outcome={other:?}");
            ExitCode::FAILURE
        }
    }
}
