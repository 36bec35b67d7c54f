
use nalgebra::Vector3;
use tracing::{debug, info};

use crate::body::{name_key, Body, BodySpec, BodyType, KBody, NameRegistry, KBODY_KIND};
use crate::config::{EngineConfig, ScenarioConfig};
use crate::error::{Result, SimError};
use crate::orbital::{KeplerOrbit, TwoBody};
use crate::physics::gravity::barycenter;
use crate::tree::{NodeId, OrderedTree, TreeError};

/// Relative tolerance for deciding that the root has left its barycenter.
const ROOT_SHIFT_EPS: f64 = 1e-9;

/// A hierarchy of bodies, each on a two-body orbit around its parent.
///
/// Lifecycle: `initialize` (or `with_config`), then `add_body` root first and
/// parents before children, then `barycenters` once, then any number of
/// `grav_interaction` ticks. After `barycenters` the set of bodies is frozen.
#[derive(Debug, Default)]
pub struct StarSystem {
    config: Option<EngineConfig>,
    registry: NameRegistry,
    tree: OrderedTree<KBody>,
    barycenters_set: bool,
}

impl StarSystem {
    /// An uninitialised system. Call [`StarSystem::initialize`] before adding bodies.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let mut system = Self::new();
        system.initialize(config)?;
        Ok(system)
    }

    /// Build a system from a parsed scenario, bodies in file order.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self> {
        let mut system = Self::with_config(scenario.engine.clone())?;
        for body in &scenario.bodies {
            system.add_body(body.to_spec()?)?;
        }
        info!(bodies = system.len(), "scenario loaded");
        Ok(system)
    }

    pub fn initialize(&mut self, config: EngineConfig) -> Result<()> {
        if self.config.is_some() {
            return Err(SimError::Configuration("system already initialised".into()));
        }
        config.validate()?;
        self.config = Some(config);
        Ok(())
    }

    pub fn config(&self) -> Result<&EngineConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| SimError::Configuration("system not initialised".into()))
    }

    pub fn is_frozen(&self) -> bool {
        self.barycenters_set
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &OrderedTree<KBody> {
        &self.tree
    }

    /// Bodies breadth-first, each family heaviest first.
    pub fn bodies(&self) -> impl Iterator<Item = &KBody> + '_ {
        self.tree.iter()
    }

    pub fn body(&self, name: &str) -> Result<&KBody> {
        self.tree
            .find(&name_key(name))
            .map_err(|_| SimError::UnknownBody(name.to_string()))
    }

    pub fn root(&self) -> Option<&KBody> {
        self.tree.root()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Validate, place and register one body. On failure nothing is kept and
    /// its name stays free.
    pub fn add_body(&mut self, spec: BodySpec) -> Result<NodeId> {
        let config = self.config()?.clone();
        if self.barycenters_set {
            return Err(SimError::Frozen);
        }

        let parent_id = match &spec.parent {
            Some(parent) => Some(
                self.tree
                    .id_of(&name_key(parent))
                    .map_err(|_| TreeError::ParentNotFound(parent.clone()))?,
            ),
            None if !self.tree.is_empty() => return Err(TreeError::AlreadyHasRoot.into()),
            None => None,
        };

        let body = Body::new(
            &mut self.registry,
            KBODY_KIND,
            config.gravitational_constant,
            &spec.init,
        )?;
        let placed = {
            let parent = parent_id.and_then(|id| self.tree.get(id));
            KBody::new(body, &spec, parent, &config)
        }
        .and_then(|kbody| self.insert(kbody));

        match placed {
            Ok(id) => {
                if let Some(kb) = self.tree.get(id) {
                    debug!(
                        name = kb.name(),
                        kind = %kb.body_type(),
                        parent = kb.parent().unwrap_or("-"),
                        perturbator = kb.is_perturbator(),
                        "body added"
                    );
                }
                Ok(id)
            }
            Err(e) => {
                self.registry.release(KBODY_KIND, &spec.init.name);
                Err(e)
            }
        }
    }

    fn insert(&mut self, kbody: KBody) -> Result<NodeId> {
        let id = match kbody.parent().map(str::to_owned) {
            Some(parent) => self.tree.add_child(kbody, &parent)?,
            None => self.tree.set_root(kbody)?,
        };
        Ok(id)
    }

    /// Remove a body (and with `cascade` its descendants) before the system
    /// is frozen. Their names become available again.
    pub fn remove_body(&mut self, name: &str, cascade: bool) -> Result<Vec<KBody>> {
        if self.barycenters_set {
            return Err(SimError::Frozen);
        }
        let removed = self.tree.remove_node(&name_key(name), cascade)?;
        for kb in &removed {
            self.registry.release(KBODY_KIND, kb.name());
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Barycenters
    // -----------------------------------------------------------------------

    /// Reduced-mass-weighted mean state of `name` and its perturbator children.
    pub fn barycenter(&self, name: &str) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let id = self
            .tree
            .id_of(&name_key(name))
            .map_err(|_| SimError::UnknownBody(name.to_string()))?;
        self.barycenter_of(id)
    }

    fn barycenter_of(&self, id: NodeId) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let (_, pos, vel) = self.subsystem(id)?;
        Ok((pos, vel))
    }

    /// Total reduced mass and mean state of `id` with its perturbator
    /// children, each child counted together with its own perturbators.
    fn subsystem(&self, id: NodeId) -> Result<(f64, Vector3<f64>, Vector3<f64>)> {
        let body = self.kbody(id)?.body();
        let own = (body.reduced_mass(), *body.position(), *body.velocity());
        let kids = self.perturbator_children(id);
        if kids.is_empty() {
            return Ok(own);
        }
        let mut members = vec![own];
        for kid in kids {
            members.push(self.subsystem(kid)?);
        }
        let mu: f64 = members.iter().map(|m| m.0).sum();
        let (pos, vel) = barycenter(members.iter().map(|(mu, p, v)| (*mu, p, v)))
            .unwrap_or((own.1, own.2));
        Ok((mu, pos, vel))
    }

    fn store_barycenter(&mut self, id: NodeId) -> Result<()> {
        let (pos, vel) = self.barycenter_of(id)?;
        self.kbody_mut(id)?.set_barycenter(pos, vel);
        Ok(())
    }

    /// Move the root barycenter to the origin, record barycenters and fit
    /// every orbit whose secondary carries perturbators to that secondary's
    /// barycenter. Freezes the system.
    pub fn barycenters(&mut self) -> Result<()> {
        self.config()?;
        if self.barycenters_set {
            return Err(SimError::Frozen);
        }
        let root = self
            .tree
            .root_id()
            .ok_or_else(|| SimError::Configuration("system has no root body".into()))?;

        let (bp, bv) = self.barycenter_of(root)?;
        let (dpos, dvel) = (-bp, -bv);
        let order = self.tree.breadth_first();
        for &id in &order {
            self.kbody_mut(id)?.body_mut().translate(&dpos, &dvel);
        }

        self.store_barycenter(root)?;
        for id in self.tree.children_ids(root).to_vec() {
            self.store_barycenter(id)?;
            if self.kbody(id)?.body_type() == BodyType::Star {
                for child in self.tree.children_ids(id).to_vec() {
                    self.store_barycenter(child)?;
                }
            }
        }

        for &id in order.iter().skip(1) {
            if !self.perturbator_children(id).is_empty() {
                self.refit_orbit(id)?;
            }
        }

        self.barycenters_set = true;
        info!(
            bodies = order.len(),
            shift = bp.norm(),
            "barycenters set, system frozen"
        );
        Ok(())
    }

    /// Re-determine the orbit of `id` around its parent from its barycenter.
    fn refit_orbit(&mut self, id: NodeId) -> Result<()> {
        let Some(parent_id) = self.tree.parent_id(id) else {
            return Ok(());
        };
        let config = self.config()?;
        let (g, tolerance) = (config.gravitational_constant, config.time_tolerance);
        let (mu, cp, cv) = self.subsystem(id)?;
        let parent = self.kbody(parent_id)?.body();
        let child = self.kbody(id)?.body();
        // The secondary carries the mass of its perturbators
        let pair = TwoBody {
            primary_mass: parent.mass(),
            secondary_mass: mu / g,
            contact: parent.radius() + child.radius(),
        };
        let orbit = KeplerOrbit::from_relative_state(
            cp - parent.position(),
            cv - parent.velocity(),
            pair,
            g,
            tolerance,
        )?;
        debug!(body = child.name(), around = parent.name(), "orbit refitted to barycenter");
        self.kbody_mut(id)?.set_orbit(orbit);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Motion
    // -----------------------------------------------------------------------

    /// Advance every body by `dt` seconds, parents before children and,
    /// within a family, perturbators before the rest.
    pub fn grav_interaction(&mut self, dt: u64) -> Result<()> {
        let root = self.require_frozen()?;

        let level1 = self.tree.children_ids(root).to_vec();
        for &id in &level1 {
            for &child in self.tree.children_ids(id) {
                if !self.tree.children_ids(child).is_empty() {
                    return Err(SimError::NotImplemented(
                        "bodies below the second hierarchy level",
                    ));
                }
            }
        }

        self.move_family(&level1, dt)?;
        for &id in &level1 {
            let family = self.tree.children_ids(id).to_vec();
            self.move_family(&family, dt)?;
        }

        let (bp, _) = self.barycenter_of(root)?;
        let rp = *self.kbody(root)?.body().position();
        if (bp - rp).norm() > ROOT_SHIFT_EPS * rp.norm().max(1.0) {
            debug!(offset = (bp - rp).norm(), "root displaced, refitting first-level orbits");
            self.store_barycenter(root)?;
            for &id in &level1 {
                self.refit_orbit(id)?;
                self.store_barycenter(id)?;
            }
        }
        Ok(())
    }

    fn move_family(&mut self, family: &[NodeId], dt: u64) -> Result<()> {
        let (first, rest): (Vec<NodeId>, Vec<NodeId>) = family
            .iter()
            .copied()
            .partition(|id| self.tree.get(*id).is_some_and(KBody::is_perturbator));
        for id in first.into_iter().chain(rest) {
            self.kepler_move_id(id, dt)?;
        }
        Ok(())
    }

    /// Advance a single body along its orbit by `dt` seconds.
    pub fn kepler_move(&mut self, name: &str, dt: u64) -> Result<()> {
        self.require_frozen()?;
        let id = self
            .tree
            .id_of(&name_key(name))
            .map_err(|_| SimError::UnknownBody(name.to_string()))?;
        self.kepler_move_id(id, dt)
    }

    fn kepler_move_id(&mut self, id: NodeId, dt: u64) -> Result<()> {
        let parent_id = self.tree.parent_id(id).ok_or_else(|| {
            SimError::InvalidArgument("the root body has no orbit to follow".into())
        })?;
        let perturbator = self.kbody(id)?.is_perturbator();
        if perturbator
            && self
                .tree
                .parent_id(parent_id)
                .and_then(|gp| self.tree.parent_id(gp))
                .is_some()
        {
            return Err(SimError::NotImplemented(
                "perturbators below the second hierarchy level",
            ));
        }

        let (dpos, dvel) = match self.kbody_mut(id)?.orbit_mut() {
            Some(orbit) => orbit.forward(dt)?,
            None => return Err(SimError::InvalidArgument("body has no orbit".into())),
        };
        let members = self.perturbator_group(id);

        if perturbator {
            // Shares of the relative displacement keep the pair barycenter fixed
            let mu_p = self.kbody(parent_id)?.body().reduced_mass();
            let (mu_c, _, _) = self.subsystem(id)?;
            let f = mu_p / (mu_p + mu_c);
            let (cp, cv) = (dpos * f, dvel * f);
            for &member in &members {
                self.kbody_mut(member)?.body_mut().translate(&cp, &cv);
            }
            let (pp, pv) = (dpos * -(1.0 - f), dvel * -(1.0 - f));
            self.kbody_mut(parent_id)?.body_mut().translate(&pp, &pv);
        } else {
            let (target_pos, target_vel) = {
                let parent = self.kbody(parent_id)?.body();
                let orbit = self
                    .kbody(id)?
                    .orbit()
                    .ok_or_else(|| SimError::InvalidArgument("body has no orbit".into()))?;
                (parent.position() + orbit.position(), parent.velocity() + orbit.velocity())
            };
            if members.len() == 1 {
                self.kbody_mut(id)?.body_mut().set_state(target_pos, target_vel);
            } else {
                let (bp, bv) = self.barycenter_of(id)?;
                let (sp, sv) = (target_pos - bp, target_vel - bv);
                for &member in &members {
                    self.kbody_mut(member)?.body_mut().translate(&sp, &sv);
                }
            }
        }

        self.store_barycenter(id)?;
        self.store_barycenter(parent_id)
    }

    /// Absolute points of the orbit of `name`, `n` samples, closed. Empty for
    /// the root.
    pub fn orbit_path(&self, name: &str, n: usize) -> Result<Vec<Vector3<f64>>> {
        let kb = self.body(name)?;
        let (Some(orbit), Some(parent)) = (kb.orbit(), kb.parent()) else {
            return Ok(Vec::new());
        };
        let origin = *self.tree.find(&parent.to_string())?.body().position();
        Ok(orbit.orbit_shape(n).into_iter().map(|p| p + origin).collect())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_frozen(&self) -> Result<NodeId> {
        self.config()?;
        if !self.barycenters_set {
            return Err(SimError::Configuration(
                "barycenters must be computed before bodies move".into(),
            ));
        }
        self.tree
            .root_id()
            .ok_or_else(|| SimError::Configuration("system has no root body".into()))
    }

    fn perturbator_children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .children_ids(id)
            .iter()
            .copied()
            .filter(|c| self.tree.get(*c).is_some_and(KBody::is_perturbator))
            .collect()
    }

    /// `id` followed by every body reached from it through perturbator links.
    fn perturbator_group(&self, id: NodeId) -> Vec<NodeId> {
        let mut group = vec![id];
        let mut next = 0;
        while next < group.len() {
            let kids = self.perturbator_children(group[next]);
            group.extend(kids);
            next += 1;
        }
        group
    }

    fn kbody(&self, id: NodeId) -> Result<&KBody> {
        self.tree
            .get(id)
            .ok_or_else(|| TreeError::NotFound(format!("{id:?}")).into())
    }

    fn kbody_mut(&mut self, id: NodeId) -> Result<&mut KBody> {
        self.tree
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("{id:?}")).into())
    }
}
