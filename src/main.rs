use std::env;
use std::io::Read;

use anyhow::{Context, Result};

use footy_cards::controller::{handle_request, CardRequest};
use footy_cards::cutoffs::CutOffs;
use footy_cards::facts::FactRepository;
use footy_cards::history::HistoryStore;
use footy_cards::publish::HttpRecordStore;

const DEFAULT_STATS_DB: &str = "statistics.db";
const DEFAULT_HISTORY_DB: &str = "questions.db";
const DEFAULT_RECORD_STORE_URL: &str = "https://api.airtable.com/v0";

fn main() -> Result<()> {
    env_logger::init();

    let request = read_request()?;
    let stats_path = env::var("STATS_DB_PATH").unwrap_or_else(|_| DEFAULT_STATS_DB.to_string());
    let history_path =
        env::var("HISTORY_DB_PATH").unwrap_or_else(|_| DEFAULT_HISTORY_DB.to_string());
    let store_url =
        env::var("RECORD_STORE_URL").unwrap_or_else(|_| DEFAULT_RECORD_STORE_URL.to_string());
    let api_key = env::var("RECORD_STORE_API_KEY").context("RECORD_STORE_API_KEY is not set")?;

    let facts = FactRepository::open(&stats_path)
        .with_context(|| format!("opening statistics database {stats_path}"))?;
    let history = HistoryStore::open(&history_path)
        .with_context(|| format!("opening history database {history_path}"))?;
    let mut store = HttpRecordStore::new(&store_url, &request.base_id, &api_key);

    let sent = handle_request(
        &request,
        &facts,
        &history,
        &mut store,
        &mut rand::thread_rng(),
        &CutOffs::default(),
    )?;
    println!("{sent}");
    Ok(())
}

/// The request JSON comes from the first argument, or stdin when absent.
fn read_request() -> Result<CardRequest> {
    let raw = match env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parsing card request")
}
