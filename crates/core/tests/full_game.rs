use rand::{rngs::StdRng, Rng, SeedableRng};
use showdown_core::{
    ClockEvent, Cursor, EngineError, GameEngine, Legend, LegendCatalog, Outcome, SessionConfig,
    TurnResolution,
};

fn configs() -> Vec<SessionConfig> {
    vec![
        SessionConfig::new(["Red", "Blue"], 1, 1),
        SessionConfig::new(["Red", "Blue"], 2, 60),
        SessionConfig::new(["A", "B", "C"], 3, 120),
        SessionConfig::new(["A", "B", "C", "D", "E"], 5, 180),
    ]
}

#[test]
fn every_game_completes_on_its_last_turn() {
    let mut rng = StdRng::seed_from_u64(2024);
    for config in configs() {
        let teams = config.teams.len();
        let total = config.total_turns();
        let mut engine = GameEngine::new();
        engine.start_game(config).expect("valid config");

        let mut correct = 0u32;
        for k in 0..total {
            let cursor = engine.cursor().unwrap();
            assert_eq!(cursor.team_index, k % teams);
            assert_eq!(cursor.round as usize, k / teams);
            assert_eq!(engine.scores().unwrap().total(), correct);

            let outcome = Outcome::from_correct(rng.random_bool(0.5));
            correct += outcome.points();
            let resolution = engine.resolve_turn(outcome).unwrap();
            if k + 1 == total {
                match resolution {
                    TurnResolution::GameComplete { scores } => assert_eq!(scores.total(), correct),
                    other => panic!("turn {k} of {total}: expected completion, got {other:?}"),
                }
            } else {
                assert!(
                    matches!(resolution, TurnResolution::NextTurn { .. }),
                    "turn {k} of {total} ended the game early"
                );
            }
        }
        assert_eq!(
            engine.resolve_turn(Outcome::Correct),
            Err(EngineError::NoActiveSession)
        );
    }
}

#[test]
fn timed_turns_drive_a_full_match() {
    let catalog = LegendCatalog::new(
        vec![Legend::new("Pele", "Sports"), Legend::new("Mozart", "Music")],
        vec![Legend::new("Grandma Rose", "Family")],
    );
    let mut rng = StdRng::seed_from_u64(7);
    let mut engine = GameEngine::new();
    engine
        .start_game(SessionConfig::new(["Red", "Blue"], 2, 5))
        .unwrap();

    let categories = ["Sports", "Family", "Music", "Cooking"];
    let mut last = None;
    for category in categories {
        let turn = engine.begin_turn(category, &catalog, &mut rng).unwrap();
        assert_eq!(turn.drawn().is_sentinel(), category == "Cooking");

        let mut expirations = 0;
        for _ in 0..8 {
            if engine.tick().unwrap() == ClockEvent::Expired {
                expirations += 1;
            }
        }
        assert_eq!(expirations, 1);
        assert!(engine.turn().unwrap().clock().is_expired());

        last = Some(engine.resolve_turn(Outcome::Correct).unwrap());
    }

    match last {
        Some(TurnResolution::GameComplete { scores }) => assert_eq!(scores.as_slice(), &[2, 2]),
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(engine.cursor().unwrap(), Cursor::new(2, 0));
}
