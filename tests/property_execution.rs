// tests/property_execution.rs

mod common;
use crate::common::FakeWork;

use std::collections::BTreeSet;
use std::sync::Arc;

use dagwalk::dag::DagGraph;
use dagwalk::engine::Execution;
use dagwalk::work::VertexWork;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

/// Random DAG as dependency lists. Acyclic by construction: vertex N may
/// only depend on vertices 0..N-1.
fn dag_strategy(max_vertices: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_vertices).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n).prop_map(
            |raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect()
            },
        )
    })
}

fn name(i: usize) -> String {
    format!("v{i:02}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn vertex_runs_iff_every_dependency_succeeded(
        deps in dag_strategy(10),
        failing in proptest::collection::btree_set(0..10usize, 0..4),
    ) {
        let names: Vec<String> = (0..deps.len()).map(name).collect();
        let dep_names: Vec<Vec<String>> = deps
            .iter()
            .map(|d| d.iter().map(|&j| name(j)).collect())
            .collect();
        let graph = DagGraph::from_edges(
            names
                .iter()
                .zip(dep_names.iter())
                .map(|(n, d)| (n.as_str(), d.iter().map(String::as_str))),
        )
        .unwrap();

        let mut work = FakeWork::new();
        for &i in failing.iter().filter(|&&i| i < names.len()) {
            work = work.failing(&names[i]);
        }

        // Expected outcome, walking vertices in dependency order.
        let mut called = vec![false; names.len()];
        let mut succeeded = vec![false; names.len()];
        for i in 0..names.len() {
            called[i] = deps[i].iter().all(|&j| succeeded[j]);
            succeeded[i] = called[i] && !failing.contains(&i);
        }

        let shared: Arc<dyn VertexWork<()>> = Arc::new(work.clone());
        let execution = Execution::builder("prop")
            .build(&graph, shared, |_| Ok(()))
            .unwrap();

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let report = rt
            .block_on(execution.run(CancellationToken::new()))
            .unwrap();

        for (i, vertex) in names.iter().enumerate() {
            prop_assert_eq!(work.was_called(vertex), called[i], "vertex {}", vertex);
            let result = report.result(vertex).unwrap();
            prop_assert_eq!(result.success, succeeded[i], "vertex {}", vertex);
            prop_assert_eq!(result.was_run(), called[i], "vertex {}", vertex);
        }
        prop_assert_eq!(report.success, succeeded.iter().all(|s| *s));
        prop_assert_eq!(report.vertices.len(), names.len());
    }
}
