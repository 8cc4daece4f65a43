use lazydml::{
    auc, Context, ContextConfig, DagError, DataCharacteristics, DenseMatrix, EngineValue,
    ExecutionError, GraphError, RecordingExecutor, ValidationError,
};
use std::sync::Arc;

fn context_with(exec: &Arc<RecordingExecutor>, config: ContextConfig) -> Context {
    Context::with_config(exec.clone(), config)
}

#[test]
fn compute_submits_auc_script() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_response(EngineValue::Scalar(0.87)).unwrap();
    let ctx = context_with(&exec, ContextConfig::default());

    let y = ctx.read_with_characteristics("labels.csv", DataCharacteristics::with_shape(100, 1));
    let p = ctx.read_with_characteristics("scores.csv", DataCharacteristics::with_shape(100, 1));
    let value = auc(&y, &p).compute().unwrap();

    assert!((value - 0.87).abs() < f64::EPSILON);
    let submitted = exec.submitted().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(
        submitted[0].statements,
        vec![
            "V0 = read('labels.csv');".to_string(),
            "V1 = read('scores.csv');".to_string(),
            "V2 = auc(Y=V0, P=V1);".to_string(),
        ]
    );
    assert_eq!(submitted[0].output, "V2");
    assert_eq!(submitted[0].context_id, ctx.id());
}

#[test]
fn auc_over_derived_inputs() {
    let exec = Arc::new(RecordingExecutor::with_fallback(EngineValue::Scalar(1.0)));
    let ctx = context_with(&exec, ContextConfig::default());

    let y = ctx.from_dense(DenseMatrix::column(vec![1.0, 0.0, 1.0]));
    let scores = ctx.from_dense(DenseMatrix::column(vec![0.9, 0.2, 0.7]));
    let p = &scores * &ctx.full(3, 1, 1.0);

    assert_eq!(auc(&y, &p).compute().unwrap(), 1.0);
    let script = &exec.submitted().unwrap()[0];
    assert_eq!(script.statements.len(), 5);
    assert_eq!(script.statements[4], "V4 = auc(Y=V0, P=V3);");
}

#[test]
fn context_mismatch_blocks_submission() {
    let exec = Arc::new(RecordingExecutor::new());
    let ctx = context_with(&exec, ContextConfig::default());
    let other = Context::new(Arc::new(RecordingExecutor::new()));

    let out = auc(&ctx.read("y"), &other.read("p"));
    let err = out.compute().unwrap_err();

    assert!(matches!(
        err,
        DagError::Validation(ValidationError::ContextMismatch { expected, actual, .. })
            if expected == ctx.id() && actual == other.id()
    ));
    assert_eq!(exec.call_count().unwrap(), 0);
}

#[test]
fn auc_shape_mismatch_blocks_submission() {
    let exec = Arc::new(RecordingExecutor::new());
    let ctx = context_with(&exec, ContextConfig::default());

    let y = ctx.read_with_characteristics("y", DataCharacteristics::with_shape(10, 1));
    let p = ctx.read_with_characteristics("p", DataCharacteristics::with_shape(12, 1));
    let err = auc(&y, &p).compute().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("Y has 10 rows, P has 12"));

    let wide = ctx.full(10, 3, 0.5);
    let err = auc(&wide, &p).compute().unwrap_err();
    assert!(err.to_string().contains("column vector"));

    assert_eq!(exec.call_count().unwrap(), 0);
}

#[test]
fn unknown_shapes_and_values_pass_to_engine() {
    let exec = Arc::new(RecordingExecutor::with_fallback(EngineValue::Scalar(0.5)));
    let ctx = context_with(&exec, ContextConfig::default());

    // labels outside {0,1} and scores outside [0,1] are the engine's concern
    let y = ctx.from_dense(DenseMatrix::column(vec![3.0, -7.0]));
    let p = ctx.from_dense(DenseMatrix::column(vec![2.5, -1.0]));
    assert_eq!(auc(&y, &p).compute().unwrap(), 0.5);

    let out = auc(&ctx.read("y"), &ctx.read("p"));
    assert_eq!(out.compute().unwrap(), 0.5);
    assert_eq!(exec.call_count().unwrap(), 2);
}

#[test]
fn disabled_validation_defers_to_engine() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_failure(ExecutionError::Rejected {
        reason: "Y and P differ in length".to_string(),
    })
    .unwrap();
    let ctx = context_with(&exec, ContextConfig::default().with_validate_on_submit(false));

    let y = ctx.read_with_characteristics("y", DataCharacteristics::with_shape(10, 1));
    let p = ctx.read_with_characteristics("p", DataCharacteristics::with_shape(12, 1));
    let err = auc(&y, &p).compute().unwrap_err();

    assert!(matches!(err, DagError::Execution(ExecutionError::Rejected { .. })));
    assert!(!err.is_retryable());
    assert_eq!(exec.call_count().unwrap(), 1);
}

#[test]
fn execution_errors_propagate() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_failure(ExecutionError::Timeout { duration_ms: 5_000 })
        .unwrap();
    let ctx = context_with(&exec, ContextConfig::default());
    let out = auc(&ctx.read("y"), &ctx.read("p"));

    let err = out.compute().unwrap_err();
    assert!(err.is_execution());
    assert!(err.is_retryable());

    // queue is drained; the fallback reply is not a scalar
    let err = out.compute().unwrap_err();
    assert!(matches!(
        err,
        DagError::Execution(ExecutionError::UnexpectedOutput { .. })
    ));
    assert_eq!(exec.call_count().unwrap(), 2);
}

#[test]
fn node_limit_surfaces_at_submit() {
    let exec = Arc::new(RecordingExecutor::new());
    let ctx = context_with(&exec, ContextConfig::default().with_max_nodes(2));
    let out = auc(&ctx.read("y"), &ctx.read("p"));

    let err = out.compute().unwrap_err();
    assert!(matches!(
        err,
        DagError::Graph(GraphError::NodeLimitExceeded { limit: 2 })
    ));
    assert_eq!(exec.call_count().unwrap(), 0);
}

#[test]
fn matrix_compute_returns_engine_matrix() {
    let result = DenseMatrix::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let exec = Arc::new(RecordingExecutor::with_fallback(EngineValue::Matrix(result.clone())));
    let ctx = context_with(&exec, ContextConfig::default());

    let a = ctx.from_dense(DenseMatrix::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap());
    let product = a.matmul(&a);
    assert_eq!(product.characteristics(), DataCharacteristics::exact(2, 2, 2));
    assert_eq!(product.compute().unwrap(), result);
}

#[test]
fn dropped_graphs_free_node_budget() {
    let exec = Arc::new(RecordingExecutor::with_fallback(EngineValue::Scalar(0.75)));
    let ctx = context_with(&exec, ContextConfig::default().with_max_nodes(10));

    for _ in 0..5 {
        let out = auc(&ctx.read("y"), &ctx.read("p"));
        assert!(out.registration_error().is_none());
    }
    assert_eq!(ctx.node_count().unwrap(), 0);

    let fresh = auc(&ctx.read("y"), &ctx.read("p"));
    assert_eq!(fresh.compute().unwrap(), 0.75);
    assert_eq!(ctx.node_count().unwrap(), 3);
}

#[test]
fn huge_seq_input_submits() {
    let exec = Arc::new(RecordingExecutor::with_fallback(EngineValue::Scalar(0.5)));
    let ctx = context_with(&exec, ContextConfig::default());

    let y = ctx.seq(0.0, 1e30, 1.0);
    let p = ctx.read("p");
    assert_eq!(auc(&y, &p).compute().unwrap(), 0.5);
}
