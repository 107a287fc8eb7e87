use proptest::prelude::*;

use bch_wallet::{settle_change, PipelineState, SendPipeline};

fn arb_state() -> impl Strategy<Value = PipelineState> {
    prop_oneof![
        Just(PipelineState::Unfunded),
        Just(PipelineState::Selected),
        Just(PipelineState::Built),
        Just(PipelineState::Signed),
        Just(PipelineState::Submitted),
        Just(PipelineState::Confirmed),
        Just(PipelineState::Rejected),
        "[a-z]{1,8}".prop_map(PipelineState::Failed),
    ]
}

fn rank(state: &PipelineState) -> usize {
    match state {
        PipelineState::Unfunded => 0,
        PipelineState::Selected => 1,
        PipelineState::Built => 2,
        PipelineState::Signed => 3,
        PipelineState::Submitted => 4,
        PipelineState::Confirmed | PipelineState::Rejected | PipelineState::Failed(_) => 5,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn change_conserves_value(
        amount in 1u64..1_000_000_000,
        fee in 0u64..1_000_000,
        extra in 0u64..1_000_000,
        dust in 0u64..10_000,
    ) {
        let total = amount + fee + extra;
        let (paid_fee, change) = settle_change(total, amount, fee, dust).unwrap();
        prop_assert_eq!(amount + paid_fee + change, total);
        prop_assert!(paid_fee >= fee);
        prop_assert!(change == 0 || change >= dust);
    }

    #[test]
    fn short_selection_is_insufficient(
        total in 0u64..1_000_000,
        amount in 1u64..1_000_000,
        fee in 1u64..1_000_000,
    ) {
        prop_assume!(total < amount + fee);
        prop_assert!(settle_change(total, amount, fee, 546).is_err());
    }

    #[test]
    fn pipeline_only_moves_forward(attempts in prop::collection::vec(arb_state(), 0..20)) {
        let mut pipeline = SendPipeline::new();
        for next in attempts {
            let before = pipeline.state().clone();
            match pipeline.advance(next.clone()) {
                Ok(()) => {
                    prop_assert!(!before.is_terminal());
                    prop_assert!(rank(&next) > rank(&before));
                    prop_assert_eq!(pipeline.state(), &next);
                }
                Err(_) => prop_assert_eq!(pipeline.state(), &before),
            }
        }

        let history = pipeline.transitions();
        prop_assert_eq!(&history[0], &PipelineState::Unfunded);
        prop_assert!(history.iter().filter(|s| s.is_terminal()).count() <= 1);
    }
}
