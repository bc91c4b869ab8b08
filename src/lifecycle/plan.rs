//! Turning an intent into primitive steps.
//!
//! Planning never touches the filesystem. It walks the dependency graph
//! against a projected copy of every package's state, asks the confirmer at
//! each cascade, and either yields the full list of steps or reports that the
//! user declined. Nothing is applied until the whole plan exists, so declining
//! anywhere leaves every package untouched.

use anyhow::Result;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;

use super::Confirmer;
use crate::error::ModError;
use crate::package::{DependencyGraph, InstallState, PackageRecord};

/// One filesystem-level transition of a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Fetch and extract the payload, leaving the package enabled.
    Install(String),
    Uninstall(String),
    Enable(String),
    Disable(String),
}

impl Step {
    pub fn package(&self) -> &str {
        match self {
            Step::Install(name) | Step::Uninstall(name) | Step::Enable(name) | Step::Disable(name) => name,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Install(name) => write!(f, "Installed {}", name),
            Step::Uninstall(name) => write!(f, "Uninstalled {}", name),
            Step::Enable(name) => write!(f, "Enabled {}", name),
            Step::Disable(name) => write!(f, "Disabled {}", name),
        }
    }
}

/// What the planner knows about a package before the operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub state: InstallState,
    pub has_update: bool,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: InstallState::NotInstalled,
            has_update: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Steps(Vec<Step>),
    /// A confirmation was refused; nothing may change.
    Declined,
}

pub struct Planner<'a, C: Confirmer + ?Sized> {
    graph: DependencyGraph<'a>,
    status: HashMap<String, Status>,
    confirmer: &'a C,
    steps: Vec<Step>,
    /// Packages whose cascade is in progress, outermost first.
    visiting: Vec<String>,
}

impl<'a, C: Confirmer + ?Sized> Planner<'a, C> {
    pub fn new(graph: DependencyGraph<'a>, status: HashMap<String, Status>, confirmer: &'a C) -> Self {
        Self {
            graph,
            status,
            confirmer,
            steps: Vec::new(),
            visiting: Vec::new(),
        }
    }

    pub fn install(mut self, name: &str) -> Result<Plan> {
        let package = self.lookup(name)?;
        let proceed = self.install_package(package)?;
        Ok(self.finish(proceed))
    }

    pub fn uninstall(mut self, name: &str) -> Result<Plan> {
        let package = self.lookup_installed(name)?;
        let proceed = self.uninstall_package(package)?;
        Ok(self.finish(proceed))
    }

    pub fn enable(mut self, name: &str) -> Result<Plan> {
        let package = self.lookup_installed(name)?;
        let proceed = self.enable_package(package)?;
        Ok(self.finish(proceed))
    }

    pub fn disable(mut self, name: &str) -> Result<Plan> {
        let package = self.lookup_installed(name)?;
        let proceed = self.disable_package(package)?;
        Ok(self.finish(proceed))
    }

    /// Uninstall followed by a fresh install of the catalog version.
    pub fn update(mut self, name: &str) -> Result<Plan> {
        let package = self.lookup_installed(name)?;
        let proceed = self.uninstall_package(package)? && self.install_package(package)?;
        Ok(self.finish(proceed))
    }

    fn finish(self, proceed: bool) -> Plan {
        if proceed {
            Plan::Steps(self.steps)
        } else {
            Plan::Declined
        }
    }

    fn lookup(&self, name: &str) -> Result<&'a PackageRecord> {
        self.graph
            .find(name)
            .ok_or_else(|| ModError::PackageNotFound(name.to_string()).into())
    }

    fn lookup_installed(&self, name: &str) -> Result<&'a PackageRecord> {
        let package = self.lookup(name)?;
        if !self.state(&package.name).is_installed() {
            return Err(ModError::NotInstalled(name.to_string()).into());
        }
        Ok(package)
    }

    fn status_of(&self, name: &str) -> Status {
        self.status.get(name).copied().unwrap_or_default()
    }

    fn state(&self, name: &str) -> InstallState {
        self.status_of(name).state
    }

    fn push(&mut self, step: Step, state: InstallState) {
        debug!("Planned: {:?}", step);
        let entry = self.status.entry(step.package().to_string()).or_default();
        entry.state = state;
        if matches!(step, Step::Install(_) | Step::Uninstall(_)) {
            entry.has_update = false;
        }
        self.steps.push(step);
    }

    fn enter(&mut self, name: &str) -> Result<()> {
        if let Some(pos) = self.visiting.iter().position(|n| n == name) {
            let mut chain = self.visiting[pos..].to_vec();
            chain.push(name.to_string());
            return Err(ModError::DependencyCycle { chain }.into());
        }
        self.visiting.push(name.to_string());
        Ok(())
    }

    fn leave(&mut self) {
        self.visiting.pop();
    }

    fn install_package(&mut self, package: &'a PackageRecord) -> Result<bool> {
        if !self.satisfy_dependencies(package)? {
            return Ok(false);
        }
        self.push(Step::Install(package.name.clone()), InstallState::Enabled);
        Ok(true)
    }

    fn uninstall_package(&mut self, package: &'a PackageRecord) -> Result<bool> {
        if !self.release_dependents(package)? {
            return Ok(false);
        }
        self.push(Step::Uninstall(package.name.clone()), InstallState::NotInstalled);
        Ok(true)
    }

    fn enable_package(&mut self, package: &'a PackageRecord) -> Result<bool> {
        if !self.satisfy_dependencies(package)? {
            return Ok(false);
        }
        if !self.state(&package.name).is_enabled() {
            self.push(Step::Enable(package.name.clone()), InstallState::Enabled);
        }
        Ok(true)
    }

    fn disable_package(&mut self, package: &'a PackageRecord) -> Result<bool> {
        if !self.release_dependents(package)? {
            return Ok(false);
        }
        if self.state(&package.name).is_enabled() {
            self.push(Step::Disable(package.name.clone()), InstallState::Disabled);
        }
        Ok(true)
    }

    /// Make every dependency of `package` enabled, with the user's consent.
    fn satisfy_dependencies(&mut self, package: &'a PackageRecord) -> Result<bool> {
        self.enter(&package.name)?;
        let result = self.satisfy_dependencies_of(package);
        self.leave();
        result
    }

    fn satisfy_dependencies_of(&mut self, package: &'a PackageRecord) -> Result<bool> {
        let unmet: Vec<&'a PackageRecord> = self
            .graph
            .dependencies(package)
            .into_iter()
            .filter(|dep| !self.state(&dep.name).is_enabled())
            .collect();
        if unmet.is_empty() {
            return Ok(true);
        }

        let names: Vec<String> = unmet.iter().map(|dep| dep.name.clone()).collect();
        let prompt = format!("{} requires the mods above. Download and enable them now?", package.name);
        if !self.confirmer.confirm(&prompt, &names)? {
            info!("Declined dependencies of {}", package.name);
            return Ok(false);
        }

        for dep in unmet {
            let status = self.status_of(&dep.name);
            // an earlier sibling's cascade may already have handled it
            if status.state.is_enabled() {
                continue;
            }
            if status.has_update && status.state.is_installed() && !self.uninstall_package(dep)? {
                return Ok(false);
            }
            let proceed = if self.state(&dep.name).is_installed() {
                self.enable_package(dep)?
            } else {
                self.install_package(dep)?
            };
            if !proceed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Disable every enabled dependent of `package`, with the user's consent.
    fn release_dependents(&mut self, package: &'a PackageRecord) -> Result<bool> {
        self.enter(&package.name)?;
        let result = self.release_dependents_of(package);
        self.leave();
        result
    }

    fn release_dependents_of(&mut self, package: &'a PackageRecord) -> Result<bool> {
        let blocking: Vec<&'a PackageRecord> = self
            .graph
            .dependents(package)
            .into_iter()
            .filter(|dependent| self.state(&dependent.name).is_enabled())
            .collect();
        if blocking.is_empty() {
            return Ok(true);
        }

        let names: Vec<String> = blocking.iter().map(|d| d.name.clone()).collect();
        let prompt = format!("The mods above rely on {}. Disable them now?", package.name);
        if !self.confirmer.confirm(&prompt, &names)? {
            info!("Declined disabling dependents of {}", package.name);
            return Ok(false);
        }

        for dependent in blocking {
            if !self.disable_package(dependent)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::MockConfirmer;
    use crate::test_utils::record;

    fn status(entries: &[(&str, InstallState, bool)]) -> HashMap<String, Status> {
        entries
            .iter()
            .map(|(name, state, has_update)| {
                (
                    name.to_string(),
                    Status {
                        state: *state,
                        has_update: *has_update,
                    },
                )
            })
            .collect()
    }

    fn accepting() -> MockConfirmer {
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm().returning(|_, _| Ok(true));
        confirmer
    }

    fn declining() -> MockConfirmer {
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm().returning(|_, _| Ok(false));
        confirmer
    }

    fn silent() -> MockConfirmer {
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm().never();
        confirmer
    }

    fn steps(plan: Plan) -> Vec<Step> {
        match plan {
            Plan::Steps(steps) => steps,
            Plan::Declined => panic!("plan was declined"),
        }
    }

    fn install(name: &str) -> Step {
        Step::Install(name.into())
    }

    #[test]
    fn test_enable_installs_missing_dependency_first() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let mut confirmer = MockConfirmer::new();
        confirmer
            .expect_confirm()
            .withf(|_, items| items == ["A".to_string()])
            .times(1)
            .returning(|_, _| Ok(true));
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("B", InstallState::Disabled, false)]),
            &confirmer,
        );

        let plan = planner.enable("B").unwrap();
        assert_eq!(steps(plan), vec![install("A"), Step::Enable("B".into())]);
    }

    #[test]
    fn test_declined_dependencies_plan_nothing() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let confirmer = declining();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("B", InstallState::Disabled, false)]),
            &confirmer,
        );

        assert_eq!(planner.enable("B").unwrap(), Plan::Declined);
    }

    #[test]
    fn test_install_with_satisfied_dependencies_does_not_ask() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let confirmer = silent();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("A", InstallState::Enabled, false)]),
            &confirmer,
        );

        assert_eq!(steps(planner.install("B").unwrap()), vec![install("B")]);
    }

    #[test]
    fn test_disabled_dependency_is_enabled_not_reinstalled() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let confirmer = accepting();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("A", InstallState::Disabled, false)]),
            &confirmer,
        );

        assert_eq!(
            steps(planner.install("B").unwrap()),
            vec![Step::Enable("A".into()), install("B")]
        );
    }

    #[test]
    fn test_outdated_dependency_is_reinstalled() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let confirmer = accepting();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("A", InstallState::Disabled, true)]),
            &confirmer,
        );

        assert_eq!(
            steps(planner.install("B").unwrap()),
            vec![Step::Uninstall("A".into()), install("A"), install("B")]
        );
    }

    #[test]
    fn test_transitive_dependencies_resolve_in_order() {
        let records = vec![record("A", &[]), record("B", &["A"]), record("C", &["B"])];
        let confirmer = accepting();
        let planner = Planner::new(DependencyGraph::new(&records), HashMap::new(), &confirmer);

        assert_eq!(
            steps(planner.install("C").unwrap()),
            vec![install("A"), install("B"), install("C")]
        );
    }

    #[test]
    fn test_shared_dependency_is_installed_once() {
        let records = vec![
            record("A", &[]),
            record("B", &["A"]),
            record("C", &["A"]),
            record("D", &["B", "C"]),
        ];
        let confirmer = accepting();
        let planner = Planner::new(DependencyGraph::new(&records), HashMap::new(), &confirmer);

        assert_eq!(
            steps(planner.install("D").unwrap()),
            vec![install("A"), install("B"), install("C"), install("D")]
        );
    }

    #[test]
    fn test_missing_dependency_name_is_ignored() {
        let records = vec![record("B", &["Ghost"])];
        let confirmer = silent();
        let planner = Planner::new(DependencyGraph::new(&records), HashMap::new(), &confirmer);

        assert_eq!(steps(planner.install("B").unwrap()), vec![install("B")]);
    }

    #[test]
    fn test_dependency_cycle_is_reported() {
        let records = vec![record("A", &["B"]), record("B", &["A"])];
        let confirmer = accepting();
        let planner = Planner::new(DependencyGraph::new(&records), HashMap::new(), &confirmer);

        let err = planner.install("A").unwrap_err();
        match err.downcast_ref::<ModError>() {
            Some(ModError::DependencyCycle { chain }) => assert_eq!(chain, &["A", "B", "A"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_disable_cascades_to_enabled_dependents() {
        let records = vec![record("A", &[]), record("B", &["A"]), record("C", &["B"])];
        let confirmer = accepting();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[
                ("A", InstallState::Enabled, false),
                ("B", InstallState::Enabled, false),
                ("C", InstallState::Enabled, false),
            ]),
            &confirmer,
        );

        assert_eq!(
            steps(planner.disable("A").unwrap()),
            vec![
                Step::Disable("C".into()),
                Step::Disable("B".into()),
                Step::Disable("A".into())
            ]
        );
    }

    #[test]
    fn test_disabled_dependents_do_not_block() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let confirmer = silent();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[
                ("A", InstallState::Enabled, false),
                ("B", InstallState::Disabled, false),
            ]),
            &confirmer,
        );

        assert_eq!(
            steps(planner.uninstall("A").unwrap()),
            vec![Step::Uninstall("A".into())]
        );
    }

    #[test]
    fn test_uninstall_declined_plans_nothing() {
        let records = vec![record("A", &[]), record("B", &["A"])];
        let confirmer = declining();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[
                ("A", InstallState::Enabled, false),
                ("B", InstallState::Enabled, false),
            ]),
            &confirmer,
        );

        assert_eq!(planner.uninstall("A").unwrap(), Plan::Declined);
    }

    #[test]
    fn test_disable_already_disabled_is_empty() {
        let records = vec![record("A", &[])];
        let confirmer = silent();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("A", InstallState::Disabled, false)]),
            &confirmer,
        );

        assert_eq!(steps(planner.disable("A").unwrap()), vec![]);
    }

    #[test]
    fn test_update_reinstalls() {
        let records = vec![record("A", &[])];
        let confirmer = silent();
        let planner = Planner::new(
            DependencyGraph::new(&records),
            status(&[("A", InstallState::Enabled, true)]),
            &confirmer,
        );

        assert_eq!(
            steps(planner.update("A").unwrap()),
            vec![Step::Uninstall("A".into()), install("A")]
        );
    }

    #[test]
    fn test_unknown_and_not_installed_packages() {
        let records = vec![record("A", &[])];
        let confirmer = silent();

        let err = Planner::new(DependencyGraph::new(&records), HashMap::new(), &confirmer)
            .install("Nope")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModError>(),
            Some(ModError::PackageNotFound(_))
        ));

        let planner = || Planner::new(DependencyGraph::new(&records), HashMap::new(), &confirmer);
        let results = [
            planner().enable("A"),
            planner().disable("A"),
            planner().uninstall("A"),
            planner().update("A"),
        ];
        for result in results {
            let err = result.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ModError>(),
                Some(ModError::NotInstalled(_))
            ));
        }
    }
}
