//! Remote scene synchronization state machine
//!
//! One tick is one pass through [`SyncClient::tick`]. The machine performs
//! at most one protocol exchange per state, except that the handshake states
//! fall straight through into their materialization loop: the records are
//! already sitting in the received frame, so decoding starts under the same
//! tick's budget.
//!
//! Failure policy is fail-fast: any connection, protocol, or decode error
//! aborts the step, tears down the connection and the held scene, and
//! returns the machine to `Idle`. Reconnecting is the caller's decision.

use bytes::Bytes;
use tracing::{debug, info, warn};

use vizlink_core::{ClientRequest, ObjectKind, VizError, VizResult};
use vizlink_scene::{
    object_frame_name, pose_to_render, position_to_render, AppearanceResolver, Pose, SceneModel,
    SceneRenderer, VisibilityFlags, VisualMarker,
};
use vizlink_transport::{TcpTransport, TransportConfig};
use vizlink_wire::{
    decode_pose_groups, encode_realtime_factor, encode_request, NamedPose, ObjectRecord, PartTag,
    ServerMessage, VisualRecord, WireReader,
};

use crate::budget::StepBudget;

/// The machine's states. `Idle` is both the initial state and the state
/// re-entered after disconnect or error; there is no terminal state while
/// connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    InitObjectsStart,
    InitializingObjects,
    InitVisualsStart,
    InitializingVisuals,
    UpdateScene,
    ReinitObjectsStart,
    ReinitializingObjects,
}

/// A received frame whose records are decoded across several ticks. The
/// cursor parks after the last completely decoded record.
struct PendingFrame {
    frame: Bytes,
    offset: usize,
}

/// The synchronization client. Explicitly constructed and owned by whatever
/// drives the per-tick loop; nothing here is a process-wide singleton.
pub struct SyncClient {
    transport: TcpTransport,
    model: SceneModel,
    appearance: Box<dyn AppearanceResolver>,
    state: ClientState,
    visibility: VisibilityFlags,
    announced_objects: u64,
    initialized_objects: u64,
    announced_visuals: u64,
    initialized_visuals: u64,
    pending: Option<PendingFrame>,
}

impl SyncClient {
    pub fn new(config: TransportConfig, appearance: Box<dyn AppearanceResolver>) -> Self {
        SyncClient {
            transport: TcpTransport::new(config),
            model: SceneModel::new(),
            appearance,
            state: ClientState::Idle,
            visibility: VisibilityFlags::default(),
            announced_objects: 0,
            initialized_objects: 0,
            announced_visuals: 0,
            initialized_visuals: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn visibility(&self) -> VisibilityFlags {
        self.visibility
    }

    /// Change the visibility toggles and re-apply them immediately.
    pub fn set_visibility(&mut self, renderer: &mut dyn SceneRenderer, flags: VisibilityFlags) {
        self.visibility = flags;
        renderer.apply_visibility(flags);
    }

    /// Open the connection and arm the initialization handshake.
    pub fn connect(&mut self) -> VizResult<()> {
        self.transport.connect()?;
        self.enter(ClientState::InitObjectsStart);
        Ok(())
    }

    /// Tear down the connection and the held scene. Safe to call in any
    /// state.
    pub fn disconnect(&mut self, renderer: &mut dyn SceneRenderer) {
        for name in self.model.clear_all() {
            renderer.destroy(&name);
        }
        renderer.clear_contact_markers();
        self.appearance.clear();
        self.pending = None;
        self.transport.close();
        self.enter(ClientState::Idle);
    }

    /// Run one state-machine step. `budget` bounds how many initialization
    /// records may be materialized; it is ignored outside the initialization
    /// states.
    pub fn tick(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        mut budget: StepBudget,
    ) -> VizResult<()> {
        if self.state == ClientState::Idle {
            return Ok(());
        }
        if !self.transport.is_alive() {
            warn!("connection lost; clearing scene");
            self.disconnect(renderer);
            return Ok(());
        }
        let result = self.step(renderer, &mut budget);
        if result.is_err() {
            self.disconnect(renderer);
        }
        result
    }

    /// Ask the server to pause the simulation. Valid whenever connected.
    pub fn pause(&mut self) -> VizResult<()> {
        self.control_request(encode_request(ClientRequest::Pause))
    }

    /// Ask the server to resume the simulation.
    pub fn resume(&mut self) -> VizResult<()> {
        self.control_request(encode_request(ClientRequest::Resume))
    }

    /// Change the server's realtime factor.
    pub fn set_realtime_factor(&mut self, factor: f64) -> VizResult<()> {
        self.control_request(encode_realtime_factor(factor))
    }

    fn enter(&mut self, state: ClientState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "state transition");
            self.state = state;
        }
    }

    fn step(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        budget: &mut StepBudget,
    ) -> VizResult<()> {
        match self.state {
            ClientState::Idle => Ok(()),
            ClientState::InitObjectsStart => {
                self.fetch_appearances()?;
                self.object_handshake()?;
                self.enter(ClientState::InitializingObjects);
                self.step_initializing_objects(renderer, budget)
            }
            ClientState::InitializingObjects => self.step_initializing_objects(renderer, budget),
            ClientState::InitVisualsStart => {
                self.visual_handshake()?;
                self.enter(ClientState::InitializingVisuals);
                self.step_initializing_visuals(renderer, budget)
            }
            ClientState::InitializingVisuals => self.step_initializing_visuals(renderer, budget),
            ClientState::UpdateScene => self.step_update(renderer),
            ClientState::ReinitObjectsStart => {
                // the held set belongs to a dead generation; destroy it
                // before the first new record can possibly arrive
                for name in self.model.clear_objects() {
                    renderer.destroy(&name);
                }
                self.object_handshake()?;
                self.enter(ClientState::ReinitializingObjects);
                self.step_initializing_objects(renderer, budget)
            }
            ClientState::ReinitializingObjects => self.step_initializing_objects(renderer, budget),
        }
    }

    // ---- request/response plumbing ----------------------------------------

    fn request(&mut self, request: ClientRequest) -> VizResult<Bytes> {
        self.transport.write_request(&encode_request(request))?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> VizResult<Bytes> {
        self.transport.read_frame()?.ok_or(VizError::ReplyTimeout)
    }

    fn control_request(&mut self, bytes: Bytes) -> VizResult<()> {
        self.transport.write_request(&bytes)?;
        let frame = self.read_reply()?;
        let mut reader = WireReader::new(&frame);
        match ServerMessage::decode(&mut reader)? {
            ServerMessage::Status => Ok(()),
            other => Err(other.unexpected("Status")),
        }
    }

    // ---- initialization ----------------------------------------------------

    /// Fetch the appearance descriptor document. `NoMessage` is a valid
    /// answer here (and only here): the server simply has no document.
    fn fetch_appearances(&mut self) -> VizResult<()> {
        let frame = self.request(ClientRequest::ConfigXml)?;
        let mut reader = WireReader::new(&frame);
        match ServerMessage::decode(&mut reader)? {
            ServerMessage::ConfigXml { document } => {
                self.appearance.ingest(&document);
                Ok(())
            }
            ServerMessage::NoMessage => Ok(()),
            other => Err(other.unexpected("ConfigXml")),
        }
    }

    fn object_handshake(&mut self) -> VizResult<()> {
        let frame = self.request(ClientRequest::Initialization)?;
        let mut reader = WireReader::new(&frame);
        match ServerMessage::decode(&mut reader)? {
            ServerMessage::Initialization {
                configuration,
                object_count,
            } => {
                info!(configuration, object_count, "initialization handshake");
                self.model.set_generation(configuration);
                self.announced_objects = object_count;
                self.initialized_objects = 0;
                self.pending = Some(PendingFrame {
                    offset: reader.position(),
                    frame,
                });
                Ok(())
            }
            other => Err(other.unexpected("Initialization")),
        }
    }

    fn visual_handshake(&mut self) -> VizResult<()> {
        let frame = self.request(ClientRequest::InitializeVisuals)?;
        let mut reader = WireReader::new(&frame);
        match ServerMessage::decode(&mut reader)? {
            ServerMessage::VisualInitialization { visual_count } => {
                info!(visual_count, "visual initialization handshake");
                self.announced_visuals = visual_count;
                self.initialized_visuals = 0;
                self.pending = Some(PendingFrame {
                    offset: reader.position(),
                    frame,
                });
                Ok(())
            }
            other => Err(other.unexpected("VisualInitialization")),
        }
    }

    fn step_initializing_objects(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        budget: &mut StepBudget,
    ) -> VizResult<()> {
        let pending = self.pending.take().ok_or(VizError::UnexpectedMessage {
            expected: "pending initialization frame",
            got: "none",
        })?;
        let mut reader = WireReader::resume(&pending.frame, pending.offset);

        while self.initialized_objects < self.announced_objects && budget.take() {
            let record = ObjectRecord::decode(&mut reader)?;
            self.materialize_object(renderer, &record)?;
            self.initialized_objects += 1;
        }

        if self.initialized_objects < self.announced_objects {
            // budget exhausted; park the cursor for the next tick
            self.pending = Some(PendingFrame {
                offset: reader.position(),
                frame: pending.frame,
            });
            return Ok(());
        }

        let held = self.model.object_count();
        if held != self.announced_objects {
            return Err(VizError::ObjectCountMismatch {
                announced: self.announced_objects,
                held,
            });
        }

        if self.state == ClientState::ReinitializingObjects {
            renderer.apply_visibility(self.visibility);
            self.enter(ClientState::UpdateScene);
        } else {
            self.enter(ClientState::InitVisualsStart);
        }
        Ok(())
    }

    fn step_initializing_visuals(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        budget: &mut StepBudget,
    ) -> VizResult<()> {
        let pending = self.pending.take().ok_or(VizError::UnexpectedMessage {
            expected: "pending visual initialization frame",
            got: "none",
        })?;
        let mut reader = WireReader::resume(&pending.frame, pending.offset);

        while self.initialized_visuals < self.announced_visuals && budget.take() {
            let record = VisualRecord::decode(&mut reader)?;
            let marker = VisualMarker::from(record);
            renderer.create_marker(&marker)?;
            self.model.insert_visual(marker);
            self.initialized_visuals += 1;
        }

        if self.initialized_visuals < self.announced_visuals {
            self.pending = Some(PendingFrame {
                offset: reader.position(),
                frame: pending.frame,
            });
            return Ok(());
        }

        renderer.apply_visibility(self.visibility);
        self.enter(ClientState::UpdateScene);
        Ok(())
    }

    fn materialize_object(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        record: &ObjectRecord,
    ) -> VizResult<()> {
        let appearance = self.appearance.lookup(&record.name);
        let frames = self.model.insert_object(record);

        if record.kind == ObjectKind::ArticulatedSystem {
            for (entry, frame) in record.entries.iter().zip(&frames) {
                renderer.create_part(frame, &entry.shape, entry.tag, None)?;
            }
            return Ok(());
        }

        let frame = object_frame_name(record.index);
        let material = appearance.as_ref().and_then(|a| a.material.as_deref());
        let collision = &record.entries[0].shape;
        renderer.create_part(&frame, collision, PartTag::Collision, material)?;

        // visual body: explicit overrides, or a mirror of the collision shape
        match appearance.as_ref().filter(|a| !a.overrides.is_empty()) {
            Some(appearance) => {
                for shape_override in &appearance.overrides {
                    let mat = shape_override.material.as_deref().or(material);
                    renderer.create_part(
                        &frame,
                        &shape_override.to_descriptor(),
                        PartTag::Visual,
                        mat,
                    )?;
                }
            }
            None => renderer.create_part(&frame, collision, PartTag::Visual, material)?,
        }
        Ok(())
    }

    // ---- steady state ------------------------------------------------------

    fn step_update(&mut self, renderer: &mut dyn SceneRenderer) -> VizResult<()> {
        if self.update_object_positions(renderer)? {
            // configuration moved on; the rest of this tick is abandoned
            self.enter(ClientState::ReinitObjectsStart);
            return Ok(());
        }
        self.update_visual_positions(renderer)?;
        self.update_contacts(renderer)
    }

    /// Returns true when the server's configuration generation no longer
    /// matches the held one.
    fn update_object_positions(&mut self, renderer: &mut dyn SceneRenderer) -> VizResult<bool> {
        let frame = self.request(ClientRequest::ObjectPosition)?;
        let mut reader = WireReader::new(&frame);
        let configuration = match ServerMessage::decode(&mut reader)? {
            ServerMessage::ObjectPositionUpdate { configuration } => configuration,
            other => return Err(other.unexpected("ObjectPositionUpdate")),
        };
        if configuration != self.model.generation() {
            info!(
                held = self.model.generation(),
                server = configuration,
                "configuration changed; reinitializing objects"
            );
            return Ok(true);
        }

        let poses = decode_pose_groups(&mut reader)?;
        self.apply_object_poses(renderer, poses)?;
        Ok(false)
    }

    fn apply_object_poses(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        poses: Vec<NamedPose>,
    ) -> VizResult<()> {
        // validate before applying: one unknown name must not leave the
        // scene partially updated
        for pose in &poses {
            if self.model.frame_pose(&pose.name).is_none() {
                return Err(VizError::UnknownObject(pose.name.clone()));
            }
        }
        for named in poses {
            let pose = Pose {
                position: named.position,
                orientation: named.orientation,
            };
            renderer.set_pose(&named.name, &pose_to_render(&pose));
            self.model.apply_frame_pose(&named.name, pose)?;
        }
        Ok(())
    }

    fn update_visual_positions(&mut self, renderer: &mut dyn SceneRenderer) -> VizResult<()> {
        let frame = self.request(ClientRequest::VisualPosition)?;
        let mut reader = WireReader::new(&frame);
        let poses = match ServerMessage::decode(&mut reader)? {
            ServerMessage::VisualPositionUpdate { poses } => poses,
            // visual markers are not versioned and the server always owns
            // some answer; NoMessage is as wrong as any other kind here
            other => return Err(other.unexpected("VisualPositionUpdate")),
        };

        for pose in &poses {
            if self.model.visual(&pose.name).is_none() {
                return Err(VizError::UnknownObject(pose.name.clone()));
            }
        }
        for named in poses {
            let pose = Pose {
                position: named.position,
                orientation: named.orientation,
            };
            renderer.set_pose(&named.name, &pose_to_render(&pose));
            self.model.apply_visual_pose(&named.name, pose)?;
        }
        Ok(())
    }

    fn update_contacts(&mut self, renderer: &mut dyn SceneRenderer) -> VizResult<()> {
        let frame = self.request(ClientRequest::ContactInfos)?;
        let mut reader = WireReader::new(&frame);
        let contacts = match ServerMessage::decode(&mut reader)? {
            // the configuration number on contact updates is informational;
            // only position updates trigger re-initialization
            ServerMessage::ContactInfoUpdate { contacts, .. } => contacts,
            other => return Err(other.unexpected("ContactInfoUpdate")),
        };

        renderer.clear_contact_markers();

        let max_norm = contacts
            .iter()
            .map(|c| c.force.norm())
            .fold(0.0f64, f64::max);

        for (ordinal, contact) in contacts.iter().enumerate() {
            let norm = contact.force.norm();
            if norm == 0.0 {
                // zero-force events are stored but draw no markers
                continue;
            }
            let position = position_to_render(&contact.position);
            if self.visibility.contact_points {
                renderer.contact_point(ordinal, position);
            }
            if self.visibility.contact_forces {
                renderer.contact_force(ordinal, position, position_to_render(&contact.force) / max_norm);
            }
        }

        self.model.replace_contacts(contacts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_starts_idle() {
        let client = SyncClient::new(
            TransportConfig::default(),
            Box::new(vizlink_scene::StaticAppearances::new()),
        );
        assert_eq!(client.state(), ClientState::Idle);
        assert!(!client.is_connected());
        assert_eq!(client.model().object_count(), 0);
    }
}
