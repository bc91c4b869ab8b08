//! Direct dependency queries over a section's package list.
//!
//! Edges are derived from declared dependency names on every query; nothing is
//! cached, so the answers always match the list they are asked about. Names
//! without a matching package are ignored. Results keep catalog order.

use super::PackageRecord;

/// Read-only view of a package list answering dependency questions.
#[derive(Clone, Copy)]
pub struct DependencyGraph<'a> {
    packages: &'a [PackageRecord],
}

impl<'a> DependencyGraph<'a> {
    pub fn new(packages: &'a [PackageRecord]) -> Self {
        Self { packages }
    }

    pub fn packages(&self) -> &'a [PackageRecord] {
        self.packages
    }

    pub fn find(&self, name: &str) -> Option<&'a PackageRecord> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Packages named in `package.dependencies`.
    pub fn dependencies(&self, package: &PackageRecord) -> Vec<&'a PackageRecord> {
        self.packages
            .iter()
            .filter(|q| package.has_dependency(&q.name))
            .collect()
    }

    /// Packages that declare `package` as a dependency.
    pub fn dependents(&self, package: &PackageRecord) -> Vec<&'a PackageRecord> {
        self.packages
            .iter()
            .filter(|q| q.has_dependency(&package.name))
            .collect()
    }

    /// True if any other package in the list depends on `package`.
    pub fn is_depended_on(&self, package: &PackageRecord) -> bool {
        self.packages.iter().any(|q| q.has_dependency(&package.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    #[test]
    fn test_dependencies_and_dependents() {
        let packages = vec![
            record("A", &[]),
            record("B", &["A"]),
            record("C", &["A", "B"]),
        ];
        let graph = DependencyGraph::new(&packages);

        let names = |list: Vec<&PackageRecord>| -> Vec<String> {
            list.into_iter().map(|p| p.name.clone()).collect()
        };

        assert!(graph.dependencies(&packages[0]).is_empty());
        assert_eq!(names(graph.dependencies(&packages[2])), vec!["A", "B"]);
        assert_eq!(names(graph.dependents(&packages[0])), vec!["B", "C"]);
        assert_eq!(names(graph.dependents(&packages[1])), vec!["C"]);
        assert!(graph.dependents(&packages[2]).is_empty());
    }

    #[test]
    fn test_unknown_dependency_names_are_ignored() {
        let packages = vec![record("A", &["Shared Framework"]), record("B", &["A"])];
        let graph = DependencyGraph::new(&packages);

        assert!(graph.dependencies(&packages[0]).is_empty());
        assert_eq!(graph.dependencies(&packages[1]).len(), 1);
    }

    #[test]
    fn test_matching_is_exact() {
        let packages = vec![record("Modding API", &[]), record("B", &["modding api"])];
        let graph = DependencyGraph::new(&packages);

        assert!(graph.dependencies(&packages[1]).is_empty());
        assert!(!graph.is_depended_on(&packages[0]));
    }

    #[test]
    fn test_cycles_are_plain_edges() {
        let packages = vec![record("A", &["B"]), record("B", &["A"])];
        let graph = DependencyGraph::new(&packages);

        assert_eq!(graph.dependencies(&packages[0])[0].name, "B");
        assert_eq!(graph.dependents(&packages[0])[0].name, "B");
        assert_eq!(graph.find("B").map(|p| p.name.as_str()), Some("B"));
        assert!(graph.find("C").is_none());
    }
}
