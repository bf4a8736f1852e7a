use clap::Parser;
use mediaqueue::{run, AppError, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match &e {
            AppError::Cancelled => eprintln!("{}", e.user_message()),
            _ => eprintln!("Error: {}", e.user_message()),
        }
        std::process::exit(e.exit_code());
    }
}
