//! The message router.
//!
//! [`MessageRouter`] is the single owner of the grid, the session
//! registry and the touch de-duplicator. Sockets never touch that state
//! directly: they post [`RouterEvent`]s into one queue and the router
//! handles them one at a time in [`MessageRouter::run`].
//!
//! Handling an event never awaits. Work that needs I/O (storing a
//! snapshot) is spawned, and its outcome comes back as another event. A grid insertion together with the
//! `imageSaved` and `newSnapShotData` broadcasts it causes is therefore a
//! single uninterrupted step, and a concurrent touch event can be relayed
//! while derivatives are still being written.
//!
//! # Routing table
//!
//! | Inbound | From | Outbound |
//! |---------|------|----------|
//! | `snapShot` | controller | `imageSaved` to controllers, then `newSnapShotData` to displays and controllers |
//! | `testSnapShot` | controller | `imageSaved` to controllers |
//! | `requestTilingParams` | controller | `requestTilingParams` to the earliest display |
//! | `muralTilingParams` | display | `muralTilingParams` to controllers |
//! | `requestImageUrlData` | either | `imageUrlData` listing the grid's images to the requesting role |
//! | `touchEvent` | controller | `touchEvent` to displays, unless a repeat |
//! | `userInputEvent` | controller | `userInputEvent` to displays |

use std::future::Future;
use std::sync::Arc;

use mural_grid::{GridPhase, TileGrid};
use mural_pipeline::{ImagePipeline, ImageStore, PipelineError};
use mural_types::{
    ControllerMessage, DisplayMessage, FolderNames, ImageId, ImageRecord, ImageUrlData, Role,
    ServerMessage, SessionId, SnapShotData, TilingParams,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::registry::{Outbox, SessionRegistry};
use crate::touch::TouchDeduplicator;

/// Everything the router reacts to.
#[derive(Debug)]
pub enum RouterEvent {
    /// A socket completed its upgrade.
    Connected {
        /// The new session.
        session: SessionId,
        /// Which endpoint it connected to.
        role: Role,
        /// Queue drained by the socket's writer task.
        outbox: Outbox,
    },
    /// A socket closed.
    Disconnected {
        /// The closed session.
        session: SessionId,
    },
    /// A decoded frame from a controller.
    Controller {
        /// The sending session.
        session: SessionId,
        /// The message.
        message: ControllerMessage,
    },
    /// A decoded frame from a display.
    Display {
        /// The sending session.
        session: SessionId,
        /// The message.
        message: DisplayMessage,
    },
    /// A snapshot submission finished.
    SnapShotStored {
        /// The submitted image.
        id: ImageId,
        /// The stored record, or why storing failed.
        result: Result<ImageRecord, PipelineError>,
    },
    /// A debug upload finished.
    TestSnapShotStored {
        /// The submitted image.
        id: ImageId,
        /// Whether the upload was written.
        result: Result<(), PipelineError>,
    },
    /// Report the relay's current state.
    Status {
        /// Where to send the report.
        reply: oneshot::Sender<RelayStatus>,
    },
}

/// Point-in-time view of the relay served by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    /// Connected display sessions.
    pub displays: usize,
    /// Connected controller sessions.
    pub controllers: usize,
    /// Grid lifecycle phase.
    pub phase: GridPhase,
    /// Grid dimensions and occupancy.
    pub tiling: TilingParams,
}

/// Owns the relay's state and applies [`RouterEvent`]s to it.
#[derive(Debug)]
pub struct MessageRouter<S> {
    grid: TileGrid,
    registry: SessionRegistry,
    touches: TouchDeduplicator,
    pipeline: Arc<ImagePipeline<S>>,
    loopback: mpsc::WeakUnboundedSender<RouterEvent>,
}

impl<S: ImageStore> MessageRouter<S> {
    /// Router over `grid` and `pipeline`.
    ///
    /// Completed pipeline work is posted back through `events`. Only a
    /// weak handle is kept, so [`run`](Self::run) ends once every other
    /// sender is dropped.
    pub fn new(
        grid: TileGrid,
        pipeline: Arc<ImagePipeline<S>>,
        events: &mpsc::UnboundedSender<RouterEvent>,
    ) -> Self {
        Self {
            grid,
            registry: SessionRegistry::new(),
            touches: TouchDeduplicator::new(),
            pipeline,
            loopback: events.downgrade(),
        }
    }

    /// Handle events until every sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<RouterEvent>) {
        info!(
            images = self.grid.len(),
            capacity = self.grid.capacity(),
            "Relay dispatcher started"
        );
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        info!("Relay dispatcher stopped");
    }

    /// Apply one event.
    pub fn handle(&mut self, event: RouterEvent) {
        match event {
            RouterEvent::Connected {
                session,
                role,
                outbox,
            } => {
                if !self.registry.register(session, role, outbox) {
                    warn!(%session, %role, "Session already registered");
                }
            }
            RouterEvent::Disconnected { session } => {
                self.registry.unregister(session);
                self.touches.forget(session);
            }
            RouterEvent::Controller { session, message } => {
                self.on_controller(session, message);
            }
            RouterEvent::Display { session, message } => self.on_display(session, message),
            RouterEvent::SnapShotStored { id, result } => self.on_snap_shot_stored(&id, result),
            RouterEvent::TestSnapShotStored { id, result } => {
                let was_successful = match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(image_id = %id, error = %e, "Test snapshot failed");
                        false
                    }
                };
                self.registry
                    .broadcast(Role::Controller, &ServerMessage::ImageSaved { was_successful });
            }
            RouterEvent::Status { reply } => {
                if reply.send(self.status()).is_err() {
                    trace!("Status requester went away");
                }
            }
        }
    }

    fn on_controller(&mut self, session: SessionId, message: ControllerMessage) {
        trace!(%session, kind = message.kind(), "Controller message");
        match message {
            ControllerMessage::SnapShot { snap_shot, id } => {
                info!(%session, image_id = %id, "Snapshot received");
                let pipeline = Arc::clone(&self.pipeline);
                self.spawn_io(async move {
                    let result = pipeline.submit(&snap_shot, id.clone()).await;
                    RouterEvent::SnapShotStored { id, result }
                });
            }
            ControllerMessage::TestSnapShot { test_snap_shot, id } => {
                let pipeline = Arc::clone(&self.pipeline);
                self.spawn_io(async move {
                    let result = pipeline.submit_test(&test_snap_shot, &id).await;
                    RouterEvent::TestSnapShotStored { id, result }
                });
            }
            ControllerMessage::RequestTilingParams => {
                match self
                    .registry
                    .send_first(Role::Display, &ServerMessage::RequestTilingParams)
                {
                    Some(target) => debug!(%session, display = %target, "Tiling params requested"),
                    None => debug!(%session, "No display connected, tiling params request dropped"),
                }
            }
            ControllerMessage::RequestImageUrlData => self.request_listing(Role::Controller),
            ControllerMessage::TouchEvent(event) => {
                if self.touches.admit(session, event) {
                    self.registry
                        .broadcast(Role::Display, &ServerMessage::TouchEvent(event));
                } else {
                    trace!(%session, cell = %event.cell(), "Repeated touch suppressed");
                }
            }
            ControllerMessage::UserInputEvent => {
                self.registry
                    .broadcast(Role::Display, &ServerMessage::UserInputEvent);
            }
        }
    }

    fn on_display(&mut self, session: SessionId, message: DisplayMessage) {
        trace!(%session, kind = message.kind(), "Display message");
        match message {
            DisplayMessage::MuralTilingParams {
                mural_tiling_params,
            } => {
                self.registry.broadcast(
                    Role::Controller,
                    &ServerMessage::MuralTilingParams {
                        mural_tiling_params,
                    },
                );
            }
            DisplayMessage::RequestImageUrlData => self.request_listing(Role::Display),
        }
    }

    fn on_snap_shot_stored(&mut self, id: &ImageId, result: Result<ImageRecord, PipelineError>) {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(image_id = %id, error = %e, "Snapshot submission failed");
                self.registry.broadcast(
                    Role::Controller,
                    &ServerMessage::ImageSaved {
                        was_successful: false,
                    },
                );
                return;
            }
        };

        let image_file_name = record.file_name.clone();
        let insertion = self.grid.insert(record);
        if let Some(evicted) = &insertion.evicted {
            info!(evicted = evicted.len(), "Oldest row evicted");
        }

        self.registry.broadcast(
            Role::Controller,
            &ServerMessage::ImageSaved {
                was_successful: true,
            },
        );

        let delta = ServerMessage::NewSnapShotData {
            new_snap_shot_data: SnapShotData {
                image_file_name,
                folders: FolderNames::standard(),
                row: insertion.cell.row,
                column: insertion.cell.column,
                evicted: insertion.evicted.is_some(),
            },
        };
        let displays = self.registry.broadcast(Role::Display, &delta);
        let controllers = self.registry.broadcast(Role::Controller, &delta);
        info!(
            image_id = %id,
            cell = %insertion.cell,
            displays = displays.delivered,
            controllers = controllers.delivered,
            "Grid updated"
        );
    }

    /// Answer a bootstrap request with the grid's own contents, so the
    /// listing agrees with the `numImages` a display reads from the tiling
    /// params.
    fn request_listing(&mut self, role: Role) {
        let image_url_data = ImageUrlData {
            image_files: self.grid.image_files(),
            folders: FolderNames::standard(),
        };
        debug!(%role, images = image_url_data.image_files.len(), "Sending image listing");
        self.registry
            .broadcast(role, &ServerMessage::ImageUrlData { image_url_data });
    }

    /// Run `work` off the dispatcher and post its event back when done.
    fn spawn_io<F>(&self, work: F)
    where
        F: Future<Output = RouterEvent> + Send + 'static,
    {
        let Some(loopback) = self.loopback.upgrade() else {
            debug!("Dispatcher shutting down, pipeline work skipped");
            return;
        };
        tokio::spawn(async move {
            let event = work.await;
            if loopback.send(event).is_err() {
                debug!("Dispatcher stopped before pipeline work finished");
            }
        });
    }

    /// Current session counts and grid state.
    pub fn status(&self) -> RelayStatus {
        RelayStatus {
            displays: self.registry.count(Role::Display),
            controllers: self.registry.count(Role::Controller),
            phase: self.grid.phase(),
            tiling: self.grid.tiling_params(),
        }
    }

    /// The grid as currently held.
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// The live sessions.
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use mural_grid::GridDimensions;
    use mural_types::{TouchEvent, TouchPhase};

    use super::*;

    /// Store that accepts everything and lists nothing.
    struct NullStore;

    impl ImageStore for NullStore {
        async fn prepare(&self) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn write_original(&self, _id: &ImageId, _bytes: Vec<u8>) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn write_derivatives(&self, _id: &ImageId) -> Vec<Result<(), PipelineError>> {
            mural_types::SizeClass::DERIVATIVES.iter().map(|_| Ok(())).collect()
        }

        async fn discard_derivatives(&self, _id: &ImageId) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn write_test(&self, _id: &ImageId, _bytes: Vec<u8>) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn list(
            &self,
            _class: mural_types::SizeClass,
        ) -> Result<Vec<mural_pipeline::StoredImage>, PipelineError> {
            Ok(Vec::new())
        }
    }

    type Inbox = mpsc::Receiver<ServerMessage>;

    struct Harness {
        router: MessageRouter<NullStore>,
        events: mpsc::UnboundedSender<RouterEvent>,
        queue: mpsc::UnboundedReceiver<RouterEvent>,
    }

    impl Harness {
        fn new(columns: u32, rows: u32) -> Self {
            let (events, queue) = mpsc::unbounded_channel();
            let grid = TileGrid::new(GridDimensions::new(columns, rows).unwrap());
            let router = MessageRouter::new(grid, Arc::new(ImagePipeline::new(NullStore)), &events);
            Self {
                router,
                events,
                queue,
            }
        }

        fn connect(&mut self, role: Role) -> (SessionId, Inbox) {
            let session = SessionId::new();
            let (outbox, inbox) = crate::registry::outbox();
            self.router.handle(RouterEvent::Connected {
                session,
                role,
                outbox,
            });
            (session, inbox)
        }

        fn stored(&mut self, name: &str) {
            let id = ImageId::parse(name).unwrap();
            self.router.handle(RouterEvent::SnapShotStored {
                result: Ok(ImageRecord::new(id.clone(), Utc::now())),
                id,
            });
        }

        fn controller(&mut self, session: SessionId, message: ControllerMessage) {
            self.router
                .handle(RouterEvent::Controller { session, message });
        }

        /// Feed the next self-posted event back into the router.
        async fn pump(&mut self) {
            let event = tokio::time::timeout(Duration::from_secs(5), self.queue.recv())
                .await
                .unwrap()
                .unwrap();
            self.router.handle(event);
        }
    }

    fn drain(inbox: &mut Inbox) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(message) = inbox.try_recv() {
            out.push(message);
        }
        out
    }

    fn delta(message: &ServerMessage) -> &SnapShotData {
        match message {
            ServerMessage::NewSnapShotData { new_snap_shot_data } => new_snap_shot_data,
            other => panic!("expected newSnapShotData, got {other:?}"),
        }
    }

    #[test]
    fn stored_snapshot_notifies_controllers_first() {
        let mut h = Harness::new(20, 11);
        let (_, mut display) = h.connect(Role::Display);
        let (_, mut controller) = h.connect(Role::Controller);

        h.stored("cat");

        let to_controller = drain(&mut controller);
        assert_eq!(to_controller.len(), 2);
        assert_eq!(
            to_controller.first().unwrap(),
            &ServerMessage::ImageSaved { was_successful: true }
        );
        assert_eq!(delta(to_controller.get(1).unwrap()).image_file_name, "cat.jpg");

        let to_display = drain(&mut display);
        assert_eq!(to_display.len(), 1);
        let data = delta(to_display.first().unwrap());
        assert_eq!((data.row, data.column, data.evicted), (0, 0, false));
        assert_eq!(h.router.grid().len(), 1);
    }

    #[test]
    fn failed_snapshot_never_reaches_grid() {
        let mut h = Harness::new(20, 11);
        let (_, mut display) = h.connect(Role::Display);
        let (_, mut controller) = h.connect(Role::Controller);

        h.router.handle(RouterEvent::SnapShotStored {
            id: ImageId::parse("cat").unwrap(),
            result: Err(PipelineError::EmptyPayload),
        });

        assert_eq!(
            drain(&mut controller),
            vec![ServerMessage::ImageSaved { was_successful: false }]
        );
        assert!(drain(&mut display).is_empty());
        assert!(h.router.grid().is_empty());
    }

    #[test]
    fn full_grid_delta_reports_eviction() {
        let mut h = Harness::new(2, 2);
        let (_, mut display) = h.connect(Role::Display);

        for name in ["a", "b", "c", "d", "e"] {
            h.stored(name);
        }

        let deltas = drain(&mut display);
        let last = delta(deltas.last().unwrap());
        assert_eq!(last.image_file_name, "e.jpg");
        assert_eq!((last.row, last.column, last.evicted), (1, 0, true));
        assert_eq!(h.router.status().tiling.num_images, 3);
        assert_eq!(h.router.status().tiling.num_rows, 2);
    }

    #[test]
    fn touch_events_are_deduplicated_per_session() {
        let mut h = Harness::new(20, 11);
        let (_, mut display) = h.connect(Role::Display);
        let (alice, _a) = h.connect(Role::Controller);
        let (bob, _b) = h.connect(Role::Controller);

        let sequence = [
            TouchEvent::new(1, 2, TouchPhase::Start),
            TouchEvent::new(1, 2, TouchPhase::Start),
            TouchEvent::new(1, 2, TouchPhase::Move),
            TouchEvent::new(1, 2, TouchPhase::Move),
            TouchEvent::new(1, 3, TouchPhase::Move),
        ];
        for event in sequence {
            h.controller(alice, ControllerMessage::TouchEvent(event));
        }
        assert_eq!(drain(&mut display).len(), 3);

        // Bob repeating Alice's last event is still forwarded.
        h.controller(bob, ControllerMessage::TouchEvent(TouchEvent::new(1, 3, TouchPhase::Move)));
        assert_eq!(drain(&mut display).len(), 1);
    }

    #[test]
    fn user_input_goes_to_displays_only() {
        let mut h = Harness::new(20, 11);
        let (_, mut display) = h.connect(Role::Display);
        let (controller, mut inbox) = h.connect(Role::Controller);

        h.controller(controller, ControllerMessage::UserInputEvent);

        assert_eq!(drain(&mut display), vec![ServerMessage::UserInputEvent]);
        assert!(drain(&mut inbox).is_empty());
    }

    #[test]
    fn tiling_params_round_trip_through_first_display() {
        let mut h = Harness::new(20, 11);
        let (controller, mut to_controller) = h.connect(Role::Controller);

        // No display yet: silently dropped.
        h.controller(controller, ControllerMessage::RequestTilingParams);
        assert!(drain(&mut to_controller).is_empty());

        let (first, mut to_first) = h.connect(Role::Display);
        let (_, mut to_second) = h.connect(Role::Display);
        h.controller(controller, ControllerMessage::RequestTilingParams);
        assert_eq!(drain(&mut to_first), vec![ServerMessage::RequestTilingParams]);
        assert!(drain(&mut to_second).is_empty());

        let params = TilingParams {
            num_columns: 20,
            max_num_rows: 11,
            num_rows: 0,
            num_images: 0,
        };
        h.router.handle(RouterEvent::Display {
            session: first,
            message: DisplayMessage::MuralTilingParams {
                mural_tiling_params: params,
            },
        });
        assert_eq!(
            drain(&mut to_controller),
            vec![ServerMessage::MuralTilingParams {
                mural_tiling_params: params
            }]
        );
    }

    #[test]
    fn disconnect_stops_delivery_and_forgets_touches() {
        let mut h = Harness::new(20, 11);
        let (display, mut inbox) = h.connect(Role::Display);
        let (controller, _c) = h.connect(Role::Controller);
        let touch = TouchEvent::new(0, 0, TouchPhase::Start);
        h.controller(controller, ControllerMessage::TouchEvent(touch));
        drain(&mut inbox);

        h.router.handle(RouterEvent::Disconnected { session: display });
        h.router.handle(RouterEvent::Disconnected { session: display });
        h.router.handle(RouterEvent::Disconnected { session: controller });
        h.controller(controller, ControllerMessage::TouchEvent(touch));

        assert!(drain(&mut inbox).is_empty());
        assert_eq!(h.router.status().displays, 0);
        assert_eq!(h.router.status().controllers, 0);
    }

    #[tokio::test]
    async fn snapshot_submission_completes_through_queue() {
        let mut h = Harness::new(20, 11);
        let (controller, mut inbox) = h.connect(Role::Controller);

        h.controller(
            controller,
            ControllerMessage::SnapShot {
                snap_shot: String::from("data:image/jpeg;base64,aGk="),
                id: ImageId::parse("2016-03-01T12:00:00.000Z").unwrap(),
            },
        );
        assert!(drain(&mut inbox).is_empty());

        h.pump().await;

        let messages = drain(&mut inbox);
        assert_eq!(
            messages.first().unwrap(),
            &ServerMessage::ImageSaved { was_successful: true }
        );
        assert!(h.router.grid().get_cell(0, 0).is_some());
    }

    #[test]
    fn image_url_data_goes_to_requesting_role() {
        let mut h = Harness::new(20, 11);
        let (display, mut to_display) = h.connect(Role::Display);
        let (_, mut to_controller) = h.connect(Role::Controller);

        h.router.handle(RouterEvent::Display {
            session: display,
            message: DisplayMessage::RequestImageUrlData,
        });

        match drain(&mut to_display).as_slice() {
            [ServerMessage::ImageUrlData { image_url_data }] => {
                assert!(image_url_data.image_files.is_empty());
                assert_eq!(image_url_data.folders, FolderNames::standard());
            }
            other => panic!("unexpected messages {other:?}"),
        }
        assert!(drain(&mut to_controller).is_empty());
    }

    #[test]
    fn listing_matches_grid_after_eviction() {
        let mut h = Harness::new(2, 2);
        for name in ["a", "b", "c", "d", "e"] {
            h.stored(name);
        }
        let (controller, mut inbox) = h.connect(Role::Controller);

        h.controller(controller, ControllerMessage::RequestImageUrlData);

        let files = match drain(&mut inbox).as_slice() {
            [ServerMessage::ImageUrlData { image_url_data }] => image_url_data.image_files.clone(),
            other => panic!("unexpected messages {other:?}"),
        };
        assert_eq!(files, vec!["c.jpg", "d.jpg", "e.jpg"]);
        assert_eq!(u32::try_from(files.len()).unwrap(), h.router.status().tiling.num_images);
    }

    #[tokio::test]
    async fn status_reply_reflects_sessions() {
        let mut h = Harness::new(20, 11);
        h.connect(Role::Display);
        let (reply, answer) = oneshot::channel();

        h.router.handle(RouterEvent::Status { reply });

        let status = answer.await.unwrap();
        assert_eq!(status.displays, 1);
        assert_eq!(status.phase, GridPhase::Empty);
        assert_eq!(status.tiling.num_columns, 20);
    }

    #[tokio::test]
    async fn run_ends_when_senders_drop() {
        let h = Harness::new(20, 11);
        let Harness {
            router,
            events,
            queue,
        } = h;
        let handle = tokio::spawn(router.run(queue));
        drop(events);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
