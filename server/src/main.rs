use clap::Parser;
use log::info;
use server::replay::replay_events;
use server::room::{Room, RoomConfig};
use server::username_manager::RebindPolicy;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufRead, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File of newline-delimited JSON room events (reads stdin when omitted)
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Number of input slots in the room
    #[arg(short, long, default_value = "4")]
    slots: usize,

    /// Free an account's old username when it binds a new one
    #[arg(long)]
    release_previous_username: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = RoomConfig {
        slot_count: args.slots,
        rebind_policy: if args.release_previous_username {
            RebindPolicy::ReleasePrevious
        } else {
            RebindPolicy::RetainPrevious
        },
    };
    info!("Opening room with {:?}", config);
    let mut room = Room::new(config);

    let reader: Box<dyn AsyncBufRead + Unpin> = match &args.events {
        Some(path) => {
            info!("Replaying events from {}", path.display());
            Box::new(BufReader::new(tokio::fs::File::open(path).await?))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let summary = replay_events(&mut room, reader).await?;
    info!(
        "Replay finished: {} applied, {} rejected, {} malformed",
        summary.applied, summary.rejected, summary.malformed
    );

    println!("{}", serde_json::to_string_pretty(&room.snapshot())?);

    room.close();
    Ok(())
}
