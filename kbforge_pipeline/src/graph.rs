//! The theme dependency graph and its resolution into execution waves.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use kbforge_core::Theme;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::extractor::Extractor;

/// A primary unit together with every follow-up reachable from it.
///
/// Tasks are what the scheduler orders: follow-ups run on the same worker,
/// right after their parent, so a task depends on the external inputs of all
/// its members and provides all their outputs.
pub struct Task {
    name: String,
    unit: Arc<dyn Extractor>,
    members: Vec<String>,
    inputs: BTreeSet<String>,
    cached_inputs: BTreeSet<String>,
    outputs: BTreeSet<String>,
}

impl Task {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn unit(&self) -> &Arc<dyn Extractor> {
        &self.unit
    }

    /// Names of the unit and its follow-ups, breadth first.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Inputs not produced inside the task.
    #[must_use]
    pub const fn inputs(&self) -> &BTreeSet<String> {
        &self.inputs
    }

    #[must_use]
    pub const fn cached_inputs(&self) -> &BTreeSet<String> {
        &self.cached_inputs
    }

    #[must_use]
    pub const fn outputs(&self) -> &BTreeSet<String> {
        &self.outputs
    }
}

/// Execution order for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Units grouped in waves. A unit only depends on units of earlier
    /// waves; inside a wave units are sorted by name.
    pub waves: Vec<Vec<String>>,
    /// Themes read from an earlier run instead of being produced.
    pub cache_hits: Vec<String>,
    /// Available themes that are produced again on request.
    pub regenerate: Vec<String>,
}

impl Plan {
    /// Units in execution order.
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.waves.iter().flatten().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "Nothing to do")?;
        }
        for (i, wave) in self.waves.iter().enumerate() {
            writeln!(f, "wave {}: {}", i + 1, wave.join(", "))?;
        }
        if !self.cache_hits.is_empty() {
            writeln!(f, "cached: {}", self.cache_hits.join(", "))?;
        }
        if !self.regenerate.is_empty() {
            writeln!(f, "regenerated: {}", self.regenerate.join(", "))?;
        }
        Ok(())
    }
}

/// Units connected by the themes they consume and produce.
pub struct UnitGraph {
    tasks: Vec<Task>,
    by_name: HashMap<String, usize>,
    producers: HashMap<String, usize>,
    consumers: HashMap<String, BTreeSet<String>>,
    themes: BTreeMap<String, Theme>,
}

impl UnitGraph {
    /// Builds the graph. Follow-ups are collected recursively. Fails when two
    /// units share a name or a theme has two producers.
    pub fn new<I>(units: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = Arc<dyn Extractor>>,
    {
        let mut graph = Self {
            tasks: Vec::new(),
            by_name: HashMap::new(),
            producers: HashMap::new(),
            consumers: HashMap::new(),
            themes: BTreeMap::new(),
        };
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut unit_names: HashSet<String> = HashSet::new();

        for unit in units {
            let index = graph.tasks.len();
            let mut members = Vec::new();
            let mut outputs = BTreeSet::new();
            let mut declared: Vec<(String, String, bool)> = Vec::new();

            let mut queue = VecDeque::from([Arc::clone(&unit)]);
            while let Some(member) = queue.pop_front() {
                let name = member.name();
                if !unit_names.insert(name.clone()) {
                    return Err(ConfigurationError::DuplicateUnit(name));
                }
                for theme in member.output() {
                    if let Some(first) = owners.get(theme.name()) {
                        return Err(ConfigurationError::DuplicateOutput {
                            theme: theme.name().to_string(),
                            first: first.clone(),
                            second: name,
                        });
                    }
                    owners.insert(theme.name().to_string(), name.clone());
                    graph.producers.insert(theme.name().to_string(), index);
                    outputs.insert(theme.name().to_string());
                    graph.add_theme(theme);
                }
                for (themes, cached) in [(member.input(), false), (member.input_cached(), true)] {
                    for theme in themes {
                        graph
                            .consumers
                            .entry(theme.name().to_string())
                            .or_default()
                            .insert(name.clone());
                        declared.push((name.clone(), theme.name().to_string(), cached));
                        graph.add_theme(theme);
                    }
                }
                members.push(name);
                queue.extend(member.follow_up());
            }

            let mut inputs = BTreeSet::new();
            let mut cached_inputs = BTreeSet::new();
            for (member, theme, cached) in declared {
                let reads_itself = owners.get(&theme) == Some(&member);
                if !reads_itself && outputs.contains(&theme) {
                    continue;
                }
                if cached {
                    cached_inputs.insert(theme.clone());
                }
                inputs.insert(theme);
            }

            let name = unit.name();
            debug!(
                "Unit {name}: {} members, inputs [{}], outputs [{}]",
                members.len(),
                inputs.iter().cloned().collect::<Vec<_>>().join(", "),
                outputs.iter().cloned().collect::<Vec<_>>().join(", ")
            );
            graph.by_name.insert(name.clone(), index);
            graph.tasks.push(Task {
                name,
                unit,
                members,
                inputs,
                cached_inputs,
                outputs,
            });
        }
        Ok(graph)
    }

    fn add_theme(&mut self, theme: Theme) {
        self.themes.entry(theme.name().to_string()).or_insert(theme);
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The task whose primary unit has this name.
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.by_name.get(name).map(|&index| &self.tasks[index])
    }

    /// Every theme any unit reads or writes, sorted by name.
    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.themes.values()
    }

    /// Every theme some unit writes, sorted by name.
    #[must_use]
    pub fn outputs(&self) -> Vec<String> {
        let mut outputs: Vec<String> = self.producers.keys().cloned().collect();
        outputs.sort();
        outputs
    }

    /// Primary unit of the task producing `theme`.
    #[must_use]
    pub fn producer_of(&self, theme: &str) -> Option<&str> {
        self.producers
            .get(theme)
            .map(|&index| self.tasks[index].name())
    }

    /// Units declaring `theme` as an input, cached or not.
    #[must_use]
    pub fn consumers_of(&self, theme: &str) -> Vec<&str> {
        self.consumers
            .get(theme)
            .map(|units| units.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// True if some unit reads `theme` from the cache location.
    #[must_use]
    pub fn is_cached_input(&self, theme: &str) -> bool {
        self.tasks
            .iter()
            .any(|task| task.cached_inputs.contains(theme))
    }

    /// Computes the units needed for `targets`.
    ///
    /// A theme for which `available` holds is a cache hit and its producer is
    /// not scheduled, unless the theme is in `regenerate`. Fails on unknown
    /// targets, inputs nobody produces and dependency cycles.
    pub fn resolve<F>(
        &self,
        targets: &[String],
        regenerate: &BTreeSet<String>,
        available: F,
    ) -> Result<Plan, ConfigurationError>
    where
        F: Fn(&str) -> bool,
    {
        let usable = |theme: &str| available(theme) && !regenerate.contains(theme);

        let mut needed: BTreeSet<usize> = BTreeSet::new();
        let mut pending: Vec<usize> = Vec::new();
        for theme in targets.iter().chain(regenerate) {
            if usable(theme) {
                continue;
            }
            let &producer = self
                .producers
                .get(theme)
                .ok_or_else(|| ConfigurationError::UnknownTarget(theme.clone()))?;
            if needed.insert(producer) {
                pending.push(producer);
            }
        }
        while let Some(index) = pending.pop() {
            let task = &self.tasks[index];
            for theme in &task.inputs {
                if usable(theme) {
                    continue;
                }
                match self.producers.get(theme) {
                    Some(&producer) => {
                        if needed.insert(producer) {
                            pending.push(producer);
                        }
                    }
                    None => {
                        return Err(ConfigurationError::MissingInput {
                            unit: task.name.clone(),
                            theme: theme.clone(),
                        });
                    }
                }
            }
        }

        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: HashMap<usize, NodeIndex> = needed
            .iter()
            .map(|&index| (index, graph.add_node(index)))
            .collect();
        for &consumer in &needed {
            for theme in &self.tasks[consumer].inputs {
                if let Some(producer) = self.producers.get(theme).filter(|p| needed.contains(p)) {
                    graph.add_edge(nodes[producer], nodes[&consumer], ());
                }
            }
        }

        let cycle = self.cyclic_themes(&graph);
        if !cycle.is_empty() {
            return Err(ConfigurationError::Cycle { themes: cycle });
        }

        let waves = self.waves(&graph, &nodes);

        let mut cache_hits = BTreeSet::new();
        let inputs = needed.iter().flat_map(|&index| self.tasks[index].inputs.iter());
        for theme in targets.iter().chain(inputs) {
            let produced_now = self
                .producers
                .get(theme)
                .is_some_and(|p| needed.contains(p));
            if usable(theme) && !produced_now {
                cache_hits.insert(theme.clone());
            }
        }

        Ok(Plan {
            waves,
            cache_hits: cache_hits.into_iter().collect(),
            regenerate: regenerate.iter().cloned().collect(),
        })
    }

    /// Themes linking the tasks of every strongly connected component that
    /// forms a cycle, sorted.
    fn cyclic_themes(&self, graph: &DiGraph<usize, ()>) -> Vec<String> {
        let mut themes = BTreeSet::new();
        for component in tarjan_scc(graph) {
            let looped = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node));
            if !looped {
                continue;
            }
            let members: BTreeSet<usize> = component.iter().map(|&node| graph[node]).collect();
            for &index in &members {
                for theme in &self.tasks[index].inputs {
                    if self
                        .producers
                        .get(theme)
                        .is_some_and(|p| members.contains(p))
                    {
                        themes.insert(theme.clone());
                    }
                }
            }
        }
        themes.into_iter().collect()
    }

    /// Kahn's algorithm, one wave per round, ties broken by unit name.
    fn waves(
        &self,
        graph: &DiGraph<usize, ()>,
        nodes: &HashMap<usize, NodeIndex>,
    ) -> Vec<Vec<String>> {
        let mut indegree: HashMap<usize, usize> = nodes
            .iter()
            .map(|(&index, &node)| {
                (
                    index,
                    graph.neighbors_directed(node, Direction::Incoming).count(),
                )
            })
            .collect();
        let mut ready: Vec<usize> = indegree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&index, _)| index)
            .collect();

        let mut waves = Vec::new();
        while !ready.is_empty() {
            ready.sort_by(|a, b| self.tasks[*a].name.cmp(&self.tasks[*b].name));
            let mut next = Vec::new();
            for index in &ready {
                for successor in graph.neighbors_directed(nodes[index], Direction::Outgoing) {
                    let successor = graph[successor];
                    if let Some(degree) = indegree.get_mut(&successor) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(successor);
                        }
                    }
                }
            }
            waves.push(
                ready
                    .iter()
                    .map(|&index| self.tasks[index].name.clone())
                    .collect(),
            );
            ready = next;
        }
        waves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExtractionContext;

    struct Stub {
        name: &'static str,
        inputs: Vec<&'static str>,
        outputs: Vec<&'static str>,
        follow_ups: Vec<Arc<dyn Extractor>>,
    }

    impl Extractor for Stub {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn input(&self) -> Vec<Theme> {
            self.inputs.iter().map(|n| Theme::new(*n, "")).collect()
        }

        fn output(&self) -> Vec<Theme> {
            self.outputs.iter().map(|n| Theme::new(*n, "")).collect()
        }

        fn follow_up(&self) -> Vec<Arc<dyn Extractor>> {
            self.follow_ups.clone()
        }

        fn extract(&self, _context: &ExtractionContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn stub(
        name: &'static str,
        inputs: Vec<&'static str>,
        outputs: Vec<&'static str>,
    ) -> Arc<dyn Extractor> {
        Arc::new(Stub {
            name,
            inputs,
            outputs,
            follow_ups: Vec::new(),
        })
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_waves_follow_dependencies() {
        let graph = UnitGraph::new([
            stub("C", vec!["t1", "t2"], vec!["t3"]),
            stub("B", vec![], vec!["t2"]),
            stub("A", vec![], vec!["t1"]),
        ])
        .expect("graph");
        let plan = graph
            .resolve(&targets(&["t3"]), &BTreeSet::new(), |_| false)
            .expect("plan");
        assert_eq!(plan.waves, vec![vec!["A", "B"], vec!["C"]]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_available_theme_is_a_cache_hit() {
        let graph = UnitGraph::new([
            stub("A", vec![], vec!["t1"]),
            stub("B", vec!["t1"], vec!["t2"]),
        ])
        .expect("graph");
        let plan = graph
            .resolve(&targets(&["t2"]), &BTreeSet::new(), |t| t == "t1")
            .expect("plan");
        assert_eq!(plan.waves, vec![vec!["B"]]);
        assert_eq!(plan.cache_hits, vec!["t1"]);

        let regenerate = BTreeSet::from(["t1".to_string()]);
        let plan = graph
            .resolve(&targets(&["t2"]), &regenerate, |t| t == "t1")
            .expect("plan");
        assert_eq!(plan.waves, vec![vec!["A"], vec!["B"]]);
        assert!(plan.cache_hits.is_empty());
    }

    #[test]
    fn test_cycle_names_its_themes() {
        let graph = UnitGraph::new([
            stub("A", vec!["fromB"], vec!["fromA"]),
            stub("B", vec!["fromA"], vec!["fromB"]),
        ]);
        let Ok(graph) = graph else {
            panic!("graph construction should succeed");
        };
        match graph.resolve(&targets(&["fromA"]), &BTreeSet::new(), |_| false) {
            Err(ConfigurationError::Cycle { themes }) => {
                assert_eq!(themes, vec!["fromA", "fromB"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let result = UnitGraph::new([
            stub("A", vec![], vec!["shared"]),
            stub("B", vec![], vec!["shared"]),
        ]);
        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateOutput { ref theme, .. }) if theme == "shared"
        ));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_missing_input_and_unknown_target() {
        let graph = UnitGraph::new([stub("B", vec!["nowhere"], vec!["t2"])]).expect("graph");
        assert!(matches!(
            graph.resolve(&targets(&["t2"]), &BTreeSet::new(), |_| false),
            Err(ConfigurationError::MissingInput { ref theme, .. }) if theme == "nowhere"
        ));
        assert!(graph
            .resolve(&targets(&["t2"]), &BTreeSet::new(), |t| t == "nowhere")
            .is_ok());
        assert!(matches!(
            graph.resolve(&targets(&["t9"]), &BTreeSet::new(), |_| false),
            Err(ConfigurationError::UnknownTarget(_))
        ));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_follow_up_outputs_belong_to_parent_task() {
        let checker = stub("Checker", vec!["raw", "rules"], vec!["checked"]);
        let parent: Arc<dyn Extractor> = Arc::new(Stub {
            name: "Parser",
            inputs: vec![],
            outputs: vec!["raw"],
            follow_ups: vec![checker],
        });
        let graph = UnitGraph::new([parent, stub("Rules", vec![], vec!["rules"])]).expect("graph");

        assert_eq!(graph.producer_of("checked"), Some("Parser"));
        let task = graph.task("Parser").expect("task");
        assert_eq!(task.members(), ["Parser", "Checker"]);
        assert_eq!(task.inputs().iter().collect::<Vec<_>>(), vec!["rules"]);

        let plan = graph
            .resolve(&targets(&["checked"]), &BTreeSet::new(), |_| false)
            .expect("plan");
        assert_eq!(plan.waves, vec![vec!["Rules"], vec!["Parser"]]);
    }
}
