use clap::{Parser, Subcommand};
use meeting_assistant::components::google_calendar::time::display_time;
use meeting_assistant::components::google_calendar::Meeting;
use meeting_assistant::error::Error;
use meeting_assistant::startup;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "meeting-assistant")]
#[command(about = "Upcoming meetings with AI summaries read aloud", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List upcoming meetings
    Meetings {
        /// Maximum number of meetings to fetch
        #[arg(short, long)]
        max: Option<u32>,
        /// Print the normalized meetings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a meeting's notes and read the summary aloud
    Summarize {
        /// Position of the meeting in the `meetings` list, starting at 1
        index: usize,
        /// Where to write the MP3 audio
        #[arg(short, long, default_value = "summary.mp3")]
        audio: PathBuf,
    },
    /// Remove a previously written summary audio file
    Clear {
        #[arg(short, long, default_value = "summary.mp3")]
        audio: PathBuf,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    startup::init_logging(cli.verbose)?;

    info!("Starting meeting assistant");

    // Load configuration
    let mut config = startup::load_config()?;

    match cli.command.unwrap_or(Command::Meetings {
        max: None,
        json: false,
    }) {
        Command::Meetings { max, json } => {
            if let Some(max) = max {
                config.max_results = max.max(1);
            }
            let mut assistant = startup::build_assistant(&config)?;
            let meetings = assistant.refresh().await?;

            if json {
                let rendered = serde_json::to_string_pretty(meetings).map_err(Error::from)?;
                println!("{}", rendered);
            } else {
                print_meetings(meetings);
            }
        }
        Command::Summarize { index, audio } => {
            let position = index
                .checked_sub(1)
                .ok_or_else(|| Error::Other("Meeting positions start at 1".to_string()))?;

            let mut assistant = startup::build_assistant(&config)?;
            assistant.ensure_meetings().await?;
            let state = assistant.generate_summary(position).await?;

            if let Some(meeting) = state.selected.and_then(|i| state.meetings.get(i)) {
                println!("📝 AI Generated Summary: {}\n", meeting.summary);
            }
            if let Some(summary) = &state.summary {
                println!("{}\n", summary);
            }

            match &state.audio {
                Some(bytes) => {
                    tokio::fs::write(&audio, bytes).await.map_err(Error::from)?;
                    println!("🔊 Audio saved to {}", audio.display());
                }
                None => warn!("No audio available for this summary"),
            }
        }
        Command::Clear { audio } => match tokio::fs::remove_file(&audio).await {
            Ok(()) => println!("Cleared {}", audio.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!("Nothing to clear");
            }
            Err(e) => return Err(Error::from(e).into()),
        },
    }

    Ok(())
}

fn print_meetings(meetings: &[Meeting]) {
    println!("📅 Upcoming Meetings");
    if meetings.is_empty() {
        println!("No upcoming meetings found");
        return;
    }

    for (position, meeting) in meetings.iter().enumerate() {
        println!(
            "\n{}. {} - {}",
            position + 1,
            meeting.summary,
            display_time(meeting.start.as_ref())
        );
        println!(
            "   Time: {} - {}",
            display_time(meeting.start.as_ref()),
            display_time(meeting.end.as_ref())
        );
        let attendees = if meeting.attendees.is_empty() {
            "None".to_string()
        } else {
            meeting.attendees.join(", ")
        };
        println!("   Attendees: {}", attendees);
        if let Some(link) = &meeting.meeting_link {
            println!("   Link: {}", link);
        }
        if !meeting.description.is_empty() {
            println!("   Description: {}", meeting.description);
        }
    }
}
