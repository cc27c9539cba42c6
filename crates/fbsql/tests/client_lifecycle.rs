//! Lifecycle contract of [`FirebirdClient::execute`]: one connection per
//! statement, commit on success, rollback on failure, and a detach on every
//! path that attached.

#[allow(dead_code)]
mod fixtures;

use asupersync::Cx;
use asupersync::runtime::RuntimeBuilder;
use fbsql::{FirebirdClient, OperationKind, Outcome, Row, Value};
use fbsql_sim::SimDriver;

use fixtures::{client_with_domain, metadata_row, options, unwrap_outcome};

#[test]
fn bootstrap_creates_the_legacy_domain_when_absent() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();

    rt.block_on(async {
        unwrap_outcome(FirebirdClient::initialize(&cx, sim.clone(), options()).await);
    });

    let executed = sim.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].contains("rdb$field_name = 'VARCHAR5000'"));
    assert_eq!(
        executed[1],
        "CREATE DOMAIN VARCHAR5000 AS VARCHAR(5000) CHARACTER SET WIN1252 COLLATE WIN_PTBR"
    );
    assert_eq!(sim.attaches(), 2);
    assert_eq!(sim.detaches(), 2);
}

#[test]
fn bootstrap_is_a_noop_when_the_domain_exists() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();

    rt.block_on(async {
        client_with_domain(&cx, &sim).await;
    });

    let executed = sim.executed();
    assert_eq!(executed.len(), 1);
    assert!(!executed[0].contains("CREATE DOMAIN"));
}

#[test]
fn execute_commits_and_detaches() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();
    sim.respond(
        "from customer",
        vec![
            Row::from_pairs(vec![("id", Value::Int(1))]),
            Row::from_pairs(vec![("id", Value::Int(2))]),
        ],
    );

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        let rows = unwrap_outcome(
            client
                .execute(&cx, "select id from customer", &[])
                .await,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some(&Value::Int(2)));
    });

    // One envelope for the bootstrap lookup, one for the statement.
    assert_eq!(sim.attaches(), 2);
    assert_eq!(sim.begins(), 2);
    assert_eq!(sim.commits(), 2);
    assert_eq!(sim.detaches(), 2);
    assert_eq!(sim.rollbacks(), 0);
}

#[test]
fn single_record_results_normalize_to_one_row() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();
    sim.respond_single(
        "gen_id(gen_order_id, 1)",
        Row::from_pairs(vec![("gen_id", Value::Int(99))]),
    );

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        let rows = unwrap_outcome(
            client
                .execute(&cx, "select gen_id(gen_order_id, 1) from rdb$database", &[])
                .await,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("gen_id"), Some(&Value::Int(99)));
    });
}

#[test]
fn query_failure_rolls_back_and_still_detaches() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();
    sim.fail_query("from missing_table", "table unknown");

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        let err = match client.execute(&cx, "select 1 from missing_table", &[]).await {
            Outcome::Err(e) => e,
            other => panic!("expected query error, got {other:?}"),
        };
        assert_eq!(err.kind(), OperationKind::Query);
        assert_eq!(err.message(), "table unknown");
    });

    assert_eq!(sim.rollbacks(), 1);
    assert_eq!(sim.commits(), 1); // bootstrap only
    assert_eq!(sim.attaches(), sim.detaches());
}

#[test]
fn commit_failure_rolls_back_and_still_detaches() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        sim.fail_commit("deadlock");

        let err = match client.execute(&cx, "update customer set active = 1", &[]).await {
            Outcome::Err(e) => e,
            other => panic!("expected commit error, got {other:?}"),
        };
        assert_eq!(err.kind(), OperationKind::Commit);
    });

    assert_eq!(sim.rollbacks(), 1);
    assert_eq!(sim.attaches(), sim.detaches());
}

#[test]
fn begin_failure_still_detaches() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        sim.fail_begin("no transactions available");

        let err = match client.execute(&cx, "select 1 from rdb$database", &[]).await {
            Outcome::Err(e) => e,
            other => panic!("expected begin error, got {other:?}"),
        };
        assert_eq!(err.kind(), OperationKind::Begin);
    });

    assert_eq!(sim.attaches(), sim.detaches());
}

#[test]
fn attach_failure_leaves_no_dangling_resources() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        let baseline = sim.attaches();
        sim.fail_attach("unavailable database");

        let err = match client.execute(&cx, "select 1 from rdb$database", &[]).await {
            Outcome::Err(e) => e,
            other => panic!("expected attach error, got {other:?}"),
        };
        assert_eq!(err.kind(), OperationKind::Attach);
        assert_eq!(sim.attaches(), baseline);
    });

    assert_eq!(sim.attaches(), sim.detaches());
}

#[test]
fn introspection_lists_relations_and_fields_in_catalog_order() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();
    sim.respond(
        "from rdb$relations",
        vec![
            Row::from_pairs(vec![("rname", "CUSTOMER".into())]),
            Row::from_pairs(vec![("rname", "INVOICE".into())]),
        ],
    );
    sim.respond(
        "order by rf.rdb$field_position",
        vec![
            Row::from_pairs(vec![("fname", "ID".into()), ("ftype", Value::Int(8))]),
            Row::from_pairs(vec![("fname", "NAME".into()), ("ftype", Value::Int(37))]),
        ],
    );

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;

        let tables = unwrap_outcome(fbsql::catalog::relations(&cx, &client).await);
        assert_eq!(tables, vec!["CUSTOMER".to_string(), "INVOICE".to_string()]);

        let fields = unwrap_outcome(
            fbsql::catalog::relation_fields(&cx, &client, "CUSTOMER").await,
        );
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "ID");
        assert_eq!(fields[0].field_type, fbsql::FieldType::Integer);
        assert_eq!(fields[1].name, "NAME");
        assert_eq!(fields[1].field_type, fbsql::FieldType::Varchar);
    });
}

#[test]
fn catalog_metadata_flows_through_execute() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let sim = SimDriver::new();
    sim.respond("upper('name')", vec![metadata_row(120, 37, "VARCHAR_120", "WIN_PTBR")]);

    rt.block_on(async {
        let client = client_with_domain(&cx, &sim).await;
        let meta = unwrap_outcome(fbsql::catalog::column(&cx, &client, "name").await)
            .expect("metadata row");
        assert_eq!(meta.length, 120);
        assert_eq!(meta.field_type, fbsql::FieldType::Varchar);
        assert_eq!(meta.source_domain, "VARCHAR_120");
        assert_eq!(meta.collation, "WIN_PTBR");
    });
}
