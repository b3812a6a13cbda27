use clap::Args;
use pomodoro_core::{Database, IntervalRecord, IntervalStore};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Session id (defaults to the most recent session)
    pub session_id: Option<i64>,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    let session_id = match args.session_id {
        Some(id) => id,
        None => match db.latest_session_id()? {
            Some(id) => id,
            None => {
                if args.json {
                    println!("[]");
                } else {
                    println!("no sessions recorded yet");
                }
                return Ok(());
            }
        },
    };

    let records = db.list_by_session(session_id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render_history(session_id, &records));
    }
    Ok(())
}

pub fn run_sessions(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let ids = db.session_ids()?;
    if json {
        println!("{}", serde_json::to_string(&ids)?);
    } else if ids.is_empty() {
        println!("no sessions recorded yet");
    } else {
        for id in ids {
            println!("{id}");
        }
    }
    Ok(())
}

fn render_history(session_id: i64, records: &[IntervalRecord]) -> String {
    if records.is_empty() {
        return format!("session {session_id}: no intervals recorded\n");
    }

    let mut out = format!("session {session_id}: {} pomodoro(s)\n", records.len());
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {}  ->  {}  {:>4} min\n",
            i + 1,
            record.start_time.format("%Y-%m-%d %H:%M:%S"),
            record.end_time.format("%H:%M:%S"),
            record.duration().num_minutes(),
        ));
    }
    out
}
