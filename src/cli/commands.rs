use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chess3d")]
#[command(about = "Chess against an engine or a remote player through a move relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a game in the terminal
    ///
    /// By default you play white against the local engine. Type squares
    /// ("e2", then "e4") or whole moves ("e2e4", "e7e8n"); "help" lists the
    /// other commands.
    ///
    /// Examples:
    ///   chess3d play --depth 12 --diff 5
    ///   chess3d play --remote
    ///   chess3d play --multiplayer --server 127.0.0.1:12345
    Play {
        /// Engine search depth
        #[arg(long)]
        depth: Option<u8>,
        /// Engine skill level (0-20)
        #[arg(long = "diff")]
        difficulty: Option<u8>,
        /// Ask the hosted engine first, falling back to the local one
        #[arg(long)]
        remote: bool,
        /// Display width hint for graphical front ends
        #[arg(long)]
        width: Option<u32>,
        /// Play against another player through the relay
        #[arg(long)]
        multiplayer: bool,
        /// Relay address (host:port)
        #[arg(long)]
        server: Option<String>,
        /// Engine executable
        #[arg(long)]
        engine: Option<String>,
        /// Play both sides locally
        #[arg(long = "hot-seat")]
        hot_seat: bool,
    },

    /// Run the move relay that pairs players
    ///
    /// Example: chess3d relay --bind 0.0.0.0:12345
    Relay {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Show the configuration file location and current values
    Config,
}
