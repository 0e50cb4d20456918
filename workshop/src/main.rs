use clap::Parser;
use std::process;

#[derive(Parser)]
#[command(name = "workshop", about = "Workshop demo microservices")]
enum CliCommand {
    /// Relay note lifecycle events to the database service
    Notifier,
    /// Resolve proxy-asserted usernames to cluster access data
    UserInfoApi,
}

fn main() {
    shared::logging::init();

    let cli = CliCommand::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match cli {
        CliCommand::Notifier => {
            tracing::info!("starting notifier");
            notifier::run().map_err(Into::into)
        }
        CliCommand::UserInfoApi => {
            tracing::info!("starting user-info API");
            user_info_api::run().map_err(Into::into)
        }
    };

    if let Err(e) = result {
        tracing::error!("service exited: {e}");
        process::exit(1);
    }
}
