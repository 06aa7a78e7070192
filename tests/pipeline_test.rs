//! End-to-end pipeline coverage over an in-memory statistics fixture: full
//! generation passes, the reserve/deficit policy and publishing.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use footy_cards::controller::{handle_request, CardRequest};
use footy_cards::cutoffs::CutOffs;
use footy_cards::facts::FactRepository;
use footy_cards::history::HistoryStore;
use footy_cards::orchestrator::run_generation;
use footy_cards::question::StoredQuestion;
use footy_cards::testing::{
    add_appearance, add_fixture, add_league, add_player, add_standing, add_team, add_transfer,
    stats_db, MemoryRecordStore,
};

const ARSENAL: i64 = 1;

fn fixture_facts() -> FactRepository {
    let conn = stats_db().unwrap();

    add_league(&conn, 1, "Premier League", None).unwrap();
    add_league(&conn, 2, "Champions League", Some("UCL")).unwrap();

    add_team(&conn, ARSENAL, "Arsenal", "Emirates Stadium", None).unwrap();
    add_team(&conn, 2, "Chelsea", "Stamford Bridge", None).unwrap();
    add_team(&conn, 3, "Liverpool", "Anfield", None).unwrap();

    let squad: [(i64, &str, &str, i64, i64); 8] = [
        (1, "Thierry Henry", "attacker", 24, 32),
        (2, "Dennis Bergkamp", "attacker", 10, 28),
        (3, "Patrick Vieira", "midfielder", 3, 30),
        (4, "Tony Adams", "defender", 1, 26),
        (5, "David Seaman", "goalkeeper", 0, 34),
        (6, "Robert Pires", "midfielder", 9, 27),
        (7, "Sol Campbell", "defender", 2, 29),
        (8, "Freddie Ljungberg", "midfielder", 6, 25),
    ];
    for (i, (id, name, position, goals, matches)) in squad.iter().enumerate() {
        add_player(&conn, *id, name, Some("1975-08-17")).unwrap();
        for season in ["2002-2003", "2003-2004", "2004-2005"] {
            add_appearance(
                &conn,
                *id,
                ARSENAL,
                1,
                season,
                position,
                Some(i as i64 + 1),
                *goals,
                *matches,
            )
            .unwrap();
        }
    }

    // Players who never appeared for Arsenal.
    for (id, name, position) in [
        (21, "Frank Lampard", "midfielder"),
        (22, "John Terry", "defender"),
        (23, "Didier Drogba", "attacker"),
        (24, "Petr Cech", "goalkeeper"),
    ] {
        add_player(&conn, id, name, Some("1978-06-20")).unwrap();
        for season in ["2004-2005", "2005-2006"] {
            add_appearance(&conn, id, 2, 1, season, position, Some(id - 13), 5, 30).unwrap();
        }
    }

    add_transfer(&conn, 7, "Tottenham Hotspur", "Arsenal", 2001).unwrap();
    add_transfer(&conn, 6, "Olympique de Marseille", "Arsenal", 2000).unwrap();
    add_transfer(&conn, 1, "Arsenal", "FC Barcelona", 2007).unwrap();
    // Invalid counterpart teams never become questions.
    add_transfer(&conn, 4, "Arsenal", "Retired", 2002).unwrap();

    for (season, home_goals, away_goals) in
        [("2002-2003", 3, 1), ("2003-2004", 2, 2), ("2004-2005", 0, 1)]
    {
        add_fixture(
            &conn,
            ARSENAL,
            2,
            1,
            season,
            "Emirates Stadium",
            home_goals,
            away_goals,
        )
        .unwrap();
        add_fixture(&conn, 3, ARSENAL, 1, season, "Anfield", 1, 2).unwrap();
    }

    add_standing(&conn, ARSENAL, 1, "2002-2003", false).unwrap();
    add_standing(&conn, ARSENAL, 1, "2003-2004", true).unwrap();
    add_standing(&conn, ARSENAL, 1, "2004-2005", false).unwrap();
    add_standing(&conn, ARSENAL, 2, "2003-2004", false).unwrap();

    FactRepository::from_connection(conn)
}

fn memory_history() -> HistoryStore {
    let store = HistoryStore::from_connection(rusqlite::Connection::open_in_memory().unwrap());
    store.ensure_schema().unwrap();
    store
}

fn reserve_entry(text: &str) -> StoredQuestion {
    StoredQuestion {
        question: text.to_string(),
        tags: "[\"rec_tag\"]".to_string(),
        parent_tags: "[\"recP\"]".to_string(),
        difficulty: "medium".to_string(),
        template: "Did $PLAYER ever play for $TEAM?".to_string(),
        answer: true,
        insert_time: String::new(),
        in_use: false,
    }
}

fn request(cards_required: usize) -> CardRequest {
    serde_json::from_value(json!({
        "parentTagRecordId": "recP",
        "parentTagTeamId": ARSENAL.to_string(),
        "cardsRequired": cards_required,
        "baseId": "app1",
        "tableId": "tblCards",
        "tagsTableId": "tblTags"
    }))
    .unwrap()
}

#[test]
fn test_generation_for_zero_count_is_empty() {
    let facts = fixture_facts();
    let mut rng = StdRng::seed_from_u64(7);
    let questions = run_generation(&facts, &mut rng, ARSENAL, 0, &CutOffs::default()).unwrap();
    assert!(questions.is_empty());
}

#[test]
fn test_generation_respects_total_and_produces_both_answers() {
    let facts = fixture_facts();
    let mut rng = StdRng::seed_from_u64(7);
    let questions = run_generation(&facts, &mut rng, ARSENAL, 400, &CutOffs::default()).unwrap();

    assert!(!questions.is_empty());
    assert!(questions.len() <= 400);
    assert!(questions.values().any(|q| q.answer));
    assert!(questions.values().any(|q| !q.answer));
    for (text, question) in &questions {
        assert!(text.ends_with('?'), "not a question: {text}");
        assert!(!question.tags.is_empty(), "untagged question: {text}");
        assert_eq!(question.parent_tags, vec!["Arsenal".to_string()]);
        assert!(question.template.contains('$'));
    }
}

#[test]
fn test_cutoff_window_excludes_out_of_range_facts() {
    let facts = fixture_facts();
    let mut cutoffs = CutOffs::default();
    // Everything in the fixture sits before 2010.
    cutoffs.set_left(ARSENAL, 2010);

    let mut rng = StdRng::seed_from_u64(7);
    let questions = run_generation(&facts, &mut rng, ARSENAL, 400, &cutoffs).unwrap();
    for text in questions.keys() {
        for season in ["2002", "2003", "2004", "2005"] {
            assert!(!text.contains(season), "out-of-window fact in: {text}");
        }
    }
}

#[test]
fn test_deficit_triggers_generation_and_spends_reserve() {
    let facts = fixture_facts();
    let history = memory_history();
    history
        .store(
            &[],
            &[
                reserve_entry("reserve question one?"),
                reserve_entry("reserve question two?"),
            ],
        )
        .unwrap();

    let mut store = MemoryRecordStore::new();
    let mut rng = StdRng::seed_from_u64(7);
    let sent = handle_request(
        &request(10),
        &facts,
        &history,
        &mut store,
        &mut rng,
        &CutOffs::default(),
    )
    .unwrap();

    let published = store.records("tblCards");
    assert_eq!(sent, published.len());
    // Both reserve entries go out first and fresh questions cover part of
    // the deficit.
    assert!(sent > 2, "only the reserve was published");
    let texts: Vec<String> = published
        .iter()
        .map(|r| r.fields["Card"].as_str().unwrap().to_string())
        .collect();
    assert!(texts.contains(&"reserve question one?".to_string()));
    assert!(texts.contains(&"reserve question two?".to_string()));

    // The spent reserve is no longer available for the next request.
    let unused = history.unused_for_parent_tag("recP").unwrap();
    assert!(!unused.iter().any(|q| q.question.starts_with("reserve")));

    // Tag names were canonicalized to record ids before publishing.
    for record in &published {
        for id in record.fields["Tags"].as_array().unwrap() {
            assert!(id.as_str().unwrap().starts_with("rec"));
        }
        assert_eq!(record.fields["Parent-tag"], json!(["recP"]));
    }
}

#[test]
fn test_deficit_is_covered_with_three_fold_overgeneration() {
    let facts = fixture_facts();
    let history = memory_history();
    history
        .store(
            &[],
            &[
                reserve_entry("reserve question one?"),
                reserve_entry("reserve question two?"),
                reserve_entry("reserve question three?"),
                reserve_entry("reserve question four?"),
            ],
        )
        .unwrap();

    let mut store = MemoryRecordStore::new();
    let mut rng = StdRng::seed_from_u64(7);
    let sent = handle_request(
        &request(10),
        &facts,
        &history,
        &mut store,
        &mut rng,
        &CutOffs::default(),
    )
    .unwrap();

    // Four in reserve and ten requested puts eighteen candidates through
    // the generators. The fixture's weights and facts yield seven fresh
    // questions, six cover the deficit and the request is met in full; a
    // smaller headroom factor would fall short of ten.
    assert_eq!(sent, 10);
    assert_eq!(store.records("tblCards").len(), 10);
    assert_eq!(history.unused_for_parent_tag("recP").unwrap().len(), 1);
}

#[test]
fn test_sufficient_reserve_skips_generation() {
    let facts = fixture_facts();
    let history = memory_history();
    history
        .store(
            &[],
            &[
                reserve_entry("reserve question one?"),
                reserve_entry("reserve question two?"),
                reserve_entry("reserve question three?"),
            ],
        )
        .unwrap();

    let mut store = MemoryRecordStore::new();
    let mut rng = StdRng::seed_from_u64(7);
    let sent = handle_request(
        &request(2),
        &facts,
        &history,
        &mut store,
        &mut rng,
        &CutOffs::default(),
    )
    .unwrap();

    assert_eq!(sent, 2);
    assert_eq!(store.records("tblCards").len(), 2);
    // Nothing new was generated or stored.
    assert_eq!(history.unused_for_parent_tag("recP").unwrap().len(), 1);
    assert!(store.records("tblTags").is_empty());
}

#[test]
fn test_generated_questions_never_repeat_history() {
    let facts = fixture_facts();
    let history = memory_history();

    let mut store = MemoryRecordStore::new();
    let mut rng = StdRng::seed_from_u64(7);
    handle_request(
        &request(5),
        &facts,
        &history,
        &mut store,
        &mut rng,
        &CutOffs::default(),
    )
    .unwrap();
    let first_batch: Vec<String> = store
        .records("tblCards")
        .iter()
        .map(|r| r.fields["Card"].as_str().unwrap().to_string())
        .collect();

    let mut second_store = MemoryRecordStore::new();
    handle_request(
        &request(5),
        &facts,
        &history,
        &mut second_store,
        &mut rng,
        &CutOffs::default(),
    )
    .unwrap();

    for record in second_store.records("tblCards") {
        let text = record.fields["Card"].as_str().unwrap();
        assert!(
            !first_batch.iter().any(|t| t == text),
            "republished question: {text}"
        );
    }
}
