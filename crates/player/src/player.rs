//! Single-task driver that serializes commands and clock ticks.

use crate::clock::IntervalClock;
use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storybar_core::{
    ClockTick, PlaybackState, ProgressEngine, SegmentConfig, SegmentEvent, SegmentObserver,
    SegmentRenderer,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Host-side settings for a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Clock ticks per second
    pub frames_per_second: u32,

    /// Completion events buffered per subscriber
    pub event_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 60,
            event_capacity: 64,
        }
    }
}

impl PlayerConfig {
    /// Set the frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frames_per_second = fps;
        self
    }

    /// Time between clock ticks.
    pub fn tick_interval(&self) -> Result<Duration> {
        if self.frames_per_second == 0 {
            return Err(PlayerError::InvalidFrameRate(0));
        }
        Ok(Duration::from_secs(1) / self.frames_per_second)
    }
}

/// A request for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Begin or continue playback
    Start,
    /// Ignore ticks
    Pause,
    /// Stop ignoring ticks
    Resume,
    /// Reset and start
    Restart,
    /// Skip to the next segment
    NextSegment,
    /// Step back one segment
    PreviousSegment,
    /// Empty the current segment
    RestartCurrentSegment,
    /// Return to the first segment, stopped
    Reset,
    /// Seek within a segment and stop the clock
    SetProgress {
        /// Segment to seek to
        index: usize,
        /// Position within it, 0-100
        percentage: f64,
    },
    /// Stop the player task
    Shutdown,
}

/// Snapshot of engine state published after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// Active segment
    pub current_index: usize,
    /// Whether ticks are ignored
    pub is_paused: bool,
    /// Derived playback state
    pub state: PlaybackState,
    /// Progress of every segment
    pub progress: Vec<f64>,
}

impl PlayerStatus {
    /// Capture the engine's current state.
    pub fn from_engine(engine: &ProgressEngine) -> Self {
        Self {
            current_index: engine.current_index(),
            is_paused: engine.is_paused(),
            state: engine.state(),
            progress: engine.progress_values(),
        }
    }
}

/// Observer that forwards completions to a broadcast channel.
#[derive(Debug)]
pub struct ChannelObserver {
    events: broadcast::Sender<SegmentEvent>,
}

impl ChannelObserver {
    /// Forward into `events`.
    pub fn new(events: broadcast::Sender<SegmentEvent>) -> Self {
        Self { events }
    }
}

impl SegmentObserver for ChannelObserver {
    fn on_segment_finished(&self, finished_index: usize, is_last_index: bool) {
        let event = SegmentEvent::Finished {
            index: finished_index,
            is_last: is_last_index,
        };
        if self.events.send(event).is_err() {
            debug!(index = finished_index, "no event subscribers");
        }
    }
}

/// Owns the engine and applies commands and ticks in arrival order.
pub struct Player {
    engine: ProgressEngine,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    ticks: mpsc::UnboundedReceiver<ClockTick>,
    status: watch::Sender<PlayerStatus>,
    // The engine only holds a weak reference
    _observer: Arc<ChannelObserver>,
}

impl Player {
    /// Build a player and its control handle.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(config: SegmentConfig, player_config: PlayerConfig) -> Result<(Self, PlayerHandle)> {
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let clock = IntervalClock::new(player_config.tick_interval()?, tick_tx)?;
        let mut engine = ProgressEngine::new(config, clock)?;

        let (event_tx, _) = broadcast::channel(player_config.event_capacity.max(1));
        let observer = Arc::new(ChannelObserver::new(event_tx.clone()));
        engine.set_observer(&observer);

        let (command_tx, commands) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(PlayerStatus::from_engine(&engine));

        let player = Self {
            engine,
            commands,
            ticks,
            status,
            _observer: observer,
        };
        let handle = PlayerHandle {
            commands: command_tx,
            status: status_rx,
            events: event_tx,
        };
        Ok((player, handle))
    }

    /// Attach a renderer. The caller keeps it alive.
    pub fn set_renderer<R: SegmentRenderer + 'static>(&mut self, renderer: &Arc<R>) {
        self.engine.set_renderer(renderer);
    }

    /// Read-only access to the engine.
    pub fn engine(&self) -> &ProgressEngine {
        &self.engine
    }

    /// Run on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and ticks until shut down or every handle is dropped.
    pub async fn run(mut self) {
        info!(segments = self.engine.segment_count(), "player started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                Some(tick) = self.ticks.recv() => {
                    self.engine.on_tick(tick.subscription, tick.delta);
                }
            }
            self.publish();
        }

        info!(index = self.engine.current_index(), state = %self.engine.state(), "player stopped");
    }

    fn apply(&mut self, command: PlayerCommand) {
        debug!(?command, "applying command");
        match command {
            PlayerCommand::Start => self.engine.start(),
            PlayerCommand::Pause => self.engine.pause(),
            PlayerCommand::Resume => self.engine.resume(),
            PlayerCommand::Restart => self.engine.restart(),
            PlayerCommand::NextSegment => self.engine.next_segment(),
            PlayerCommand::PreviousSegment => self.engine.previous_segment(),
            PlayerCommand::RestartCurrentSegment => self.engine.restart_current_segment(),
            PlayerCommand::Reset => self.engine.reset(),
            PlayerCommand::SetProgress { index, percentage } => {
                self.engine.set_progress_manually(index, percentage)
            }
            PlayerCommand::Shutdown => {}
        }
    }

    fn publish(&self) {
        let status = PlayerStatus::from_engine(&self.engine);
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Cloneable control surface for a running [`Player`].
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    status: watch::Receiver<PlayerStatus>,
    events: broadcast::Sender<SegmentEvent>,
}

impl PlayerHandle {
    /// Queue a command.
    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| PlayerError::Closed)
    }

    /// Begin or continue playback.
    pub fn start(&self) -> Result<()> {
        self.send(PlayerCommand::Start)
    }

    /// Ignore ticks.
    pub fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause)
    }

    /// Stop ignoring ticks.
    pub fn resume(&self) -> Result<()> {
        self.send(PlayerCommand::Resume)
    }

    /// Reset and start.
    pub fn restart(&self) -> Result<()> {
        self.send(PlayerCommand::Restart)
    }

    /// Skip to the next segment.
    pub fn next_segment(&self) -> Result<()> {
        self.send(PlayerCommand::NextSegment)
    }

    /// Step back one segment.
    pub fn previous_segment(&self) -> Result<()> {
        self.send(PlayerCommand::PreviousSegment)
    }

    /// Empty the current segment.
    pub fn restart_current_segment(&self) -> Result<()> {
        self.send(PlayerCommand::RestartCurrentSegment)
    }

    /// Return to the first segment, stopped.
    pub fn reset(&self) -> Result<()> {
        self.send(PlayerCommand::Reset)
    }

    /// Seek within a segment and stop the clock.
    pub fn set_progress_manually(&self, index: usize, percentage: f64) -> Result<()> {
        self.send(PlayerCommand::SetProgress { index, percentage })
    }

    /// Stop the player task.
    pub fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown)
    }

    /// Latest published status.
    pub fn status(&self) -> PlayerStatus {
        self.status.borrow().clone()
    }

    /// Wait until the status satisfies `predicate`.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&PlayerStatus) -> bool) -> Result<PlayerStatus> {
        self.status
            .wait_for(predicate)
            .await
            .map(|status| status.clone())
            .map_err(|_| PlayerError::Closed)
    }

    /// Receive completion events from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SegmentEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    fn player(count: usize, duration: f64) -> (Player, PlayerHandle) {
        let config = SegmentConfig::new(count).with_duration(duration);
        Player::new(config, PlayerConfig::default().with_fps(100)).unwrap()
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(PlayerConfig::default().tick_interval().unwrap(), Duration::from_secs(1) / 60);
        assert_eq!(
            PlayerConfig::default().with_fps(100).tick_interval().unwrap(),
            Duration::from_millis(10)
        );
        assert!(matches!(
            PlayerConfig::default().with_fps(0).tick_interval(),
            Err(PlayerError::InvalidFrameRate(0))
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_config() {
        let config = SegmentConfig::new(2).with_duration(-1.0);
        let result = Player::new(config, PlayerConfig::default());
        assert!(matches!(result, Err(PlayerError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_every_segment() {
        let (player, mut handle) = player(3, 0.1);
        let mut events = handle.subscribe_events();
        let task = player.spawn();
        handle.start().unwrap();

        let mut seen = Vec::new();
        loop {
            let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
            let SegmentEvent::Finished { index, is_last } = event;
            seen.push((index, is_last));
            if is_last {
                break;
            }
        }
        assert_eq!(seen, vec![(0, false), (1, false), (2, true)]);

        let status = handle.wait_for(|s| s.state == PlaybackState::Finished).await.unwrap();
        assert_eq!(status.current_index, 2);
        assert_eq!(status.progress, vec![1.0, 1.0, 1.0]);

        handle.shutdown().unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_progress() {
        let (player, mut handle) = player(2, 1.0);
        let task = player.spawn();
        handle.start().unwrap();

        handle.wait_for(|s| s.progress[0] > 0.1).await.unwrap();
        handle.pause().unwrap();
        let paused = handle.wait_for(|s| s.is_paused).await.unwrap();
        assert_eq!(paused.state, PlaybackState::Paused);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.status().progress, paused.progress);

        handle.resume().unwrap();
        handle
            .wait_for(|s| s.progress[0] > paused.progress[0])
            .await
            .unwrap();

        handle.shutdown().unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_stops_playback() {
        let (player, mut handle) = player(3, 1.0);
        let task = player.spawn();
        handle.start().unwrap();
        handle.set_progress_manually(1, 50.0).unwrap();

        let status = handle
            .wait_for(|s| s.current_index == 1 && s.state == PlaybackState::Idle)
            .await
            .unwrap();
        assert_eq!(status.progress[1], 0.5);

        sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.status().progress[1], 0.5);

        handle.shutdown().unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_segment_through_handle() {
        let (player, mut handle) = player(3, 10.0);
        let mut events = handle.subscribe_events();
        let task = player.spawn();

        handle.next_segment().unwrap();
        let status = handle.wait_for(|s| s.current_index == 1).await.unwrap();
        assert_eq!(status.progress[0], 1.0);
        assert_eq!(status.state, PlaybackState::Running);
        assert!(events.try_recv().is_err());

        handle.shutdown().unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_commands_after_shutdown_fail() {
        let (player, handle) = player(1, 1.0);
        let task = player.spawn();
        handle.shutdown().unwrap();
        task.await.unwrap();

        assert!(matches!(handle.start(), Err(PlayerError::Closed)));
    }
}
