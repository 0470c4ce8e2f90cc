#[tokio::main]
async fn main() {
    if let Err(e) = smartcover_proxy::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
