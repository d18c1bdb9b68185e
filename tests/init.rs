// tests/init.rs

use std::error::Error;

use tokio_util::sync::CancellationToken;

use stagedag::dag::{Graph, GraphOptions, OpOptions, OpStatus};
use stagedag_test_utils::init_tracing;
use stagedag_test_utils::journal::Journal;

type TestResult = Result<(), Box<dyn Error>>;

fn with_init() -> Graph {
    Graph::with_options(GraphOptions {
        enable_init: true,
        collect_orphans: false,
    })
}

#[tokio::test]
async fn isolated_operations_are_skipped_without_init() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let mut g = Graph::new();
    g.add("lonely", OpOptions::new().callback(journal.record("lonely")))?;
    g.add(
        "foo",
        OpOptions::new()
            .callback(journal.record("foo"))
            .depends_on(["bar"]),
    )?;
    g.add("bar", OpOptions::new().callback(journal.record("bar")))?;

    g.run(CancellationToken::new()).await?;

    assert_eq!(journal.joined(), "barfoo");
    let lonely = g.state("lonely").expect("lonely registered");
    assert_eq!(lonely.status, OpStatus::Skipped);
    assert!(!lonely.executed);
    Ok(())
}

#[tokio::test]
async fn init_runs_isolated_operations() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let mut g = with_init();
    g.add("foo", OpOptions::new().callback(journal.record("foo")))?;

    g.run(CancellationToken::new()).await?;

    assert_eq!(journal.joined(), "foo");
    let foo = g.state("foo").expect("foo registered");
    assert_eq!(foo.status, OpStatus::Succeeded);
    assert!(foo.executed);
    Ok(())
}

#[tokio::test]
async fn init_runs_every_callback_of_an_isolated_operation() -> TestResult {
    let journal = Journal::new();
    let mut g = with_init();
    g.add(
        "foo",
        OpOptions::new().callbacks([journal.record("a"), journal.record("b")]),
    )?;

    g.run(CancellationToken::new()).await?;

    let mut entries = journal.entries();
    entries.sort();
    assert_eq!(entries, vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn init_does_not_appear_as_an_operation() -> TestResult {
    let mut g = with_init();
    g.add("foo", OpOptions::new())?;
    g.depend_on("bar", "baz")?;

    let names: Vec<&str> = g.names().collect();
    assert_eq!(names.len(), 3);

    let layers = g.layers()?;
    let total: usize = layers.iter().map(Vec::len).sum();
    assert_eq!(total, 3);
    assert!(layers[0].contains(&"foo".to_string()));
    Ok(())
}

#[tokio::test]
async fn isolated_operation_can_be_added_by_a_later_merge() -> TestResult {
    let journal = Journal::new();
    let mut g = Graph::new();
    g.add("late", OpOptions::new().callback(journal.record("late")))?;
    // Declaring a dependency later anchors the operation.
    g.add("late", OpOptions::new().depends_on(["early"]))?;
    g.add("early", OpOptions::new().callback(journal.record("early")))?;

    g.run(CancellationToken::new()).await?;

    assert_eq!(journal.joined(), "earlylate");
    Ok(())
}
