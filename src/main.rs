use txfuzz::cmd::run_cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
