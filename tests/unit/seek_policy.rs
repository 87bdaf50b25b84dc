use routersense_sync::seek::SeekPolicy;

#[test]
fn test_default_policy_constants() {
    let policy = SeekPolicy::default();
    assert_eq!(policy.max_attempts, 20);
    assert_eq!(policy.tolerance_hours, 0.5);
    assert_eq!(policy.stuck_equality_hours, 0.1);
    assert_eq!(policy.stuck_streak_threshold, 3);
}

#[test]
fn test_step_schedule_coarsens_with_error() {
    let policy = SeekPolicy::default();
    let errors = [0.6, 3.5, 13.0, 50.0, 125.0, 250.0, 500.0];
    let steps: Vec<f64> = errors.iter().map(|e| policy.step_fraction(*e)).collect();
    assert_eq!(steps, vec![0.002, 0.005, 0.01, 0.02, 0.04, 0.08, 0.15]);
}

#[test]
fn test_step_direction_follows_error_sign() {
    let policy = SeekPolicy::default();
    for error in [0.6, 3.5, 13.0, 50.0, 125.0, 250.0, 500.0] {
        assert!(policy.step_fraction(error) > 0.0);
        assert!(policy.step_fraction(-error) < 0.0);
        assert_eq!(policy.step_fraction(error), -policy.step_fraction(-error));
    }
}

#[test]
fn test_bracket_edges_are_exclusive() {
    // Exactly at a threshold the finer step applies; only strictly above
    // does the coarser one kick in.
    let policy = SeekPolicy::default();
    assert_eq!(policy.step_fraction(480.0), 0.08);
    assert_eq!(policy.step_fraction(480.1), 0.15);
    assert_eq!(policy.step_fraction(3.0), 0.002);
    assert_eq!(policy.step_fraction(3.1), 0.005);
}
