mod common;

use common::*;
use pickleball_rating::database::{games, ratings, GameStore};
use pickleball_rating::domain::{GameDraft, Lineup, Violation};
use pickleball_rating::errors::EngineError;
use pickleball_rating::services::Recorded;

fn saved_game_id(recorded: Recorded) -> i64 {
    match recorded {
        Recorded::Saved { game, .. } => game.id,
        Recorded::Rejected(violations) => panic!("game rejected: {violations:?}"),
    }
}

fn doubles_draft(fx: &Fixture) -> GameDraft {
    GameDraft {
        team_one_second: Some(fx.players[1]),
        team_two_second: Some(fx.players[3]),
        ..singles_draft(fx, fx.players[0], fx.players[2])
    }
}

#[test]
fn structural_violations_are_returned_not_stored() {
    let mut fx = fixture(2);
    let draft = with_result(singles_draft(&fx, fx.players[0], fx.players[1]), 11, 11, may(2, 18));

    let recorded = recorder().record(&mut fx.store, &draft).unwrap();

    assert_eq!(recorded, Recorded::Rejected(vec![Violation::TiedScore]));
    assert!(games::list_all(fx.store.conn()).unwrap().is_empty());
}

#[test]
fn oversized_scores_are_rejected_before_rating() {
    let mut fx = fixture(2);
    let draft = singles_draft(&fx, fx.players[0], fx.players[1]);

    let overflowing = with_result(draft.clone(), 4_000_000_000, 300_000_000, may(2, 18));
    assert_eq!(
        recorder().record(&mut fx.store, &overflowing).unwrap(),
        Recorded::Rejected(vec![
            Violation::ScoreOutOfRange(4_000_000_000),
            Violation::ScoreOutOfRange(300_000_000)
        ])
    );

    let beyond_u32 = with_result(draft, 5_000_000_000, 3, may(2, 18));
    assert_eq!(
        recorder().record(&mut fx.store, &beyond_u32).unwrap(),
        Recorded::Rejected(vec![Violation::ScoreOutOfRange(5_000_000_000)])
    );

    assert!(games::list_all(fx.store.conn()).unwrap().is_empty());
    assert!(ratings::list_all(fx.store.conn()).unwrap().is_empty());
}

#[test]
fn unknown_references_are_rejected() {
    let mut fx = fixture(2);
    let draft = GameDraft {
        game_type_id: Some(99),
        ..singles_draft(&fx, fx.players[0], 42)
    };

    let recorded = recorder().record(&mut fx.store, &draft).unwrap();

    assert_eq!(
        recorded,
        Recorded::Rejected(vec![Violation::UnknownPlayer(42), Violation::UnknownGameType(99)])
    );
    assert!(games::list_all(fx.store.conn()).unwrap().is_empty());
}

#[test]
fn amending_a_missing_game_fails() {
    let mut fx = fixture(2);
    let draft = singles_draft(&fx, fx.players[0], fx.players[1]);

    let result = recorder().amend(&mut fx.store, 7, &draft);

    assert!(matches!(result, Err(EngineError::GameNotFound(7))));
}

#[test]
fn played_game_cannot_go_back_to_scheduled() {
    let mut fx = fixture(2);
    let draft = singles_draft(&fx, fx.players[0], fx.players[1]);
    let game_id = saved_game_id(
        recorder()
            .record(&mut fx.store, &with_result(draft.clone(), 11, 4, may(2, 18)))
            .unwrap(),
    );

    let recorded = recorder().amend(&mut fx.store, game_id, &draft).unwrap();

    assert_eq!(recorded, Recorded::Rejected(vec![Violation::PlayedGameUnscheduled]));
    assert!(fx.store.get_game(game_id).unwrap().unwrap().is_played());
}

#[test]
fn amending_doubles_to_singles_drops_partner_samples() {
    let mut fx = fixture(4);
    let draft = with_result(doubles_draft(&fx), 11, 6, may(2, 18));
    let game_id = saved_game_id(recorder().record(&mut fx.store, &draft).unwrap());
    assert_eq!(ratings::list_all(fx.store.conn()).unwrap().len(), 4);

    let singles = GameDraft {
        team_one_second: None,
        team_two_second: None,
        ..draft
    };
    let Recorded::Saved { game, outcome } = recorder().amend(&mut fx.store, game_id, &singles).unwrap() else {
        panic!("amendment rejected");
    };

    assert_eq!(game.version, 2);
    assert_eq!(game.lineup, Lineup::Singles { team_one: fx.players[0], team_two: fx.players[2] });
    assert_eq!(outcome.samples.len(), 2);

    let mut remaining: Vec<i64> = ratings::list_all(fx.store.conn())
        .unwrap()
        .into_iter()
        .filter(|entry| entry.game_id == game_id)
        .map(|entry| entry.player_id)
        .collect();
    remaining.sort();
    assert_eq!(remaining, vec![fx.players[0], fx.players[2]]);
}

#[test]
fn amended_result_overwrites_samples_in_place() {
    let mut fx = fixture(2);
    let draft = singles_draft(&fx, fx.players[0], fx.players[1]);
    let game_id = saved_game_id(
        recorder()
            .record(&mut fx.store, &with_result(draft.clone(), 11, 8, may(2, 18)))
            .unwrap(),
    );
    let before = ratings::list_all(fx.store.conn()).unwrap();

    recorder()
        .amend(&mut fx.store, game_id, &with_result(draft, 4, 11, may(2, 18)))
        .unwrap();
    let after = ratings::list_all(fx.store.conn()).unwrap();

    assert_eq!(after.len(), 2);
    assert_eq!(
        after.iter().map(|e| e.sequence).collect::<Vec<_>>(),
        before.iter().map(|e| e.sequence).collect::<Vec<_>>()
    );
    assert!(after[0].rating < 250 && after[1].rating > 250);

    // Prediction inputs did not change, so neither did its version.
    let prediction = fx.store.get_prediction(game_id).unwrap().unwrap();
    assert_eq!(prediction.version, 1);
}

#[test]
fn moving_the_played_date_bumps_the_prediction_version() {
    let mut fx = fixture(2);
    let draft = singles_draft(&fx, fx.players[0], fx.players[1]);
    let game_id = saved_game_id(
        recorder()
            .record(&mut fx.store, &with_result(draft.clone(), 11, 8, may(2, 18)))
            .unwrap(),
    );

    recorder()
        .amend(&mut fx.store, game_id, &with_result(draft, 11, 8, may(3, 18)))
        .unwrap();

    let prediction = fx.store.get_prediction(game_id).unwrap().unwrap();
    assert_eq!(prediction.version, 2);
    assert_eq!(prediction.computed_at, may(3, 18));
}

#[test]
fn stale_read_is_a_conflict() {
    let mut fx = fixture(2);
    let draft = singles_draft(&fx, fx.players[0], fx.players[1]);
    let game_id = saved_game_id(recorder().record(&mut fx.store, &draft).unwrap());
    let stale = fx.store.get_game(game_id).unwrap().unwrap();

    recorder()
        .amend(&mut fx.store, game_id, &with_result(draft, 11, 2, may(2, 18)))
        .unwrap();
    let result = predictions().process_atomically(&mut fx.store, &stale);

    assert!(matches!(result, Err(EngineError::Conflict(id)) if id == game_id));
    assert_eq!(fx.store.game_version(game_id).unwrap(), Some(2));
    assert_eq!(ratings::list_all(fx.store.conn()).unwrap().len(), 2);
}

#[test]
fn refreshing_ratings_without_a_prediction_is_an_invariant_violation() {
    let mut fx = fixture(2);
    let lineup = Lineup::Singles {
        team_one: fx.players[0],
        team_two: fx.players[1],
    };
    let game = insert_game(&mut fx, lineup, played(11, 5, may(2, 18)));

    let error = predictions().refresh_ratings(&mut fx.store, &game).unwrap_err();

    assert!(matches!(error, EngineError::MissingPrediction(id) if id == game.id));
    assert!(error.is_invariant_violation());
    assert!(ratings::list_all(fx.store.conn()).unwrap().is_empty());
}

#[test]
fn refresh_is_stable() {
    let mut fx = fixture(2);
    let draft = with_result(singles_draft(&fx, fx.players[0], fx.players[1]), 11, 8, may(2, 18));
    let game_id = saved_game_id(recorder().record(&mut fx.store, &draft).unwrap());
    let before = ratings::list_all(fx.store.conn()).unwrap();

    let outcome = recorder().refresh(&mut fx.store, game_id).unwrap();

    assert_eq!(outcome.prediction.version, 1);
    assert_eq!(ratings::list_all(fx.store.conn()).unwrap(), before);
    assert!(matches!(
        recorder().refresh(&mut fx.store, game_id + 1),
        Err(EngineError::GameNotFound(_))
    ));
}
