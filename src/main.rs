//! Innovara site - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = innovara_site::run().await {
        eprintln!("innovara-site: {}", e);
        std::process::exit(1);
    }
}
