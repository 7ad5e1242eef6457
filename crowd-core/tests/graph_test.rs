use crowd_core::graph::DependencyGraph;
use crowd_core::package::Package;
use crowd_core::Error;

fn package(name: &str, deps: &[&str]) -> Package {
    Package::new(
        name.to_string(),
        name.into(),
        deps.iter().map(|d| d.to_string()).collect(),
    )
}

fn create_test_packages() -> Vec<Package> {
    vec![
        package("pkg-a", &[]),
        package("pkg-b", &["pkg-a"]),
        package("pkg-c", &["pkg-b"]),
    ]
}

#[test]
fn test_toposort_puts_consumers_first() {
    let graph = DependencyGraph::from_packages(create_test_packages());
    let order = graph.toposort().unwrap();

    assert_eq!(order, vec!["pkg-c", "pkg-b", "pkg-a"]);
}

#[test]
fn test_build_order() {
    let graph = DependencyGraph::from_packages(create_test_packages());
    let order = graph.build_order().unwrap();

    assert_eq!(order, vec!["pkg-a", "pkg-b", "pkg-c"]);
}

#[test]
fn test_roots() {
    let graph = DependencyGraph::from_packages(create_test_packages());
    assert_eq!(graph.roots(), vec!["pkg-c"]);
}

#[test]
fn test_roots_of_diamond() {
    let graph = DependencyGraph::from_packages(vec![
        package("base", &[]),
        package("left", &["base"]),
        package("right", &["base"]),
        package("app", &["left", "right"]),
        package("tool", &[]),
    ]);

    assert_eq!(graph.roots(), vec!["app", "tool"]);

    let order = graph.build_order().unwrap();
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert_eq!(order.len(), 5);
    assert!(pos("base") < pos("left"));
    assert!(pos("base") < pos("right"));
    assert!(pos("left") < pos("app"));
    assert!(pos("right") < pos("app"));
}

#[test]
fn test_external_dependencies_are_ignored() {
    let graph = DependencyGraph::from_packages(vec![
        package("pkg-a", &["lodash", "typescript"]),
        package("pkg-b", &["pkg-a", "react"]),
    ]);

    assert_eq!(graph.dependencies("pkg-a").unwrap(), Vec::<String>::new());
    assert_eq!(graph.dependencies("pkg-b").unwrap(), vec!["pkg-a"]);
    assert_eq!(graph.toposort().unwrap(), vec!["pkg-b", "pkg-a"]);
}

#[test]
fn test_dependencies_keep_declaration_order() {
    let graph = DependencyGraph::from_packages(vec![
        package("x", &[]),
        package("y", &[]),
        package("z", &[]),
        package("app", &["z", "x", "y"]),
    ]);

    assert_eq!(graph.dependencies("app").unwrap(), vec!["z", "x", "y"]);
}

#[test]
fn test_dependents() {
    let graph = DependencyGraph::from_packages(create_test_packages());

    let dependents = graph.dependents("pkg-a").unwrap();
    assert_eq!(dependents, vec!["pkg-b"]);

    let dependents = graph.dependents("pkg-c").unwrap();
    assert!(dependents.is_empty());
}

#[test]
fn test_unknown_package() {
    let graph = DependencyGraph::from_packages(create_test_packages());
    let err = graph.dependencies("missing").unwrap_err();
    assert!(matches!(err, Error::PackageNotFound { .. }));
}

#[test]
fn test_circular_dependency() {
    let graph = DependencyGraph::from_packages(vec![
        package("pkg-a", &["pkg-b"]),
        package("pkg-b", &["pkg-a"]),
    ]);

    let err = graph.check_cycles().unwrap_err();
    match &err {
        Error::CycleDetected(path) => {
            assert!(path.contains(&"pkg-a".to_string()));
            assert!(path.contains(&"pkg-b".to_string()));
            assert_eq!(path.first(), path.last());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("dependency cycle detected: "));
    assert!(graph.toposort().is_err());
}

#[test]
fn test_cycle_below_a_root() {
    let graph = DependencyGraph::from_packages(vec![
        package("app", &["core"]),
        package("core", &["util"]),
        package("util", &["core"]),
    ]);

    match graph.check_cycles().unwrap_err() {
        Error::CycleDetected(path) => {
            assert_eq!(path, vec!["core", "util", "core"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let graph = DependencyGraph::from_packages(vec![package("loop", &["loop"])]);

    match graph.check_cycles().unwrap_err() {
        Error::CycleDetected(path) => assert_eq!(path, vec!["loop", "loop"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_check_cycles_is_repeatable() {
    let graph = DependencyGraph::from_packages(create_test_packages());
    graph.check_cycles().unwrap();
    graph.check_cycles().unwrap();
}

#[test]
fn test_filter() {
    let graph = DependencyGraph::from_packages(vec![
        package("pkg-a", &[]).with_script("build", "tsc"),
        package("pkg-b", &["pkg-a"]),
        package("pkg-c", &["pkg-b"]).with_script("build", "tsc"),
    ]);

    let missing: Vec<&str> = graph
        .filter(|p| !p.has_script("build"))
        .into_iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(missing, vec!["pkg-b"]);
    assert_eq!(graph.packages().count(), 3);
}

#[test]
fn test_nodes() {
    let graph = DependencyGraph::from_packages(create_test_packages());
    let nodes = graph.nodes();

    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[2].name, "pkg-c");
    assert_eq!(nodes[2].children, vec!["pkg-b"]);
    assert!(nodes[0].children.is_empty());
}

#[test]
fn test_empty_graph() {
    let graph = DependencyGraph::from_packages(Vec::new());
    assert!(graph.is_empty());
    assert!(graph.toposort().unwrap().is_empty());
    assert!(graph.roots().is_empty());
}

#[test]
fn test_rebuilt_graph_orders_consistently() {
    let first = DependencyGraph::from_packages(create_test_packages());
    let second = DependencyGraph::from_packages(create_test_packages());
    assert_eq!(first.toposort().unwrap(), second.toposort().unwrap());
}

fn long_chain(length: usize) -> Vec<Package> {
    (0..length)
        .map(|i| {
            let deps: Vec<String> = if i == 0 {
                Vec::new()
            } else {
                vec![format!("p{}", i - 1)]
            };
            Package::new(format!("p{}", i), format!("p{}", i).into(), deps)
        })
        .collect()
}

#[test]
fn test_long_chain() {
    let graph = DependencyGraph::from_packages(long_chain(20_000));

    graph.check_cycles().unwrap();
    let order = graph.build_order().unwrap();
    assert_eq!(order.len(), 20_000);
    assert_eq!(order[0], "p0");
    assert_eq!(order[19_999], "p19999");
    assert_eq!(graph.roots(), vec!["p19999"]);
}

#[test]
fn test_cycle_at_the_end_of_a_long_chain() {
    let mut packages = long_chain(20_000);
    packages[0].deps.push("p19999".to_string());
    let graph = DependencyGraph::from_packages(packages);

    match graph.check_cycles().unwrap_err() {
        Error::CycleDetected(path) => {
            assert_eq!(path.len(), 20_001);
            assert_eq!(path.first(), path.last());
        }
        other => panic!("unexpected error: {other}"),
    }
}
