//! Live track set a fusion backend works on.

use tracing::debug;

use crate::tracker::track::Track;

/// Foreground (dynamic obstacles) and background (static environment) tracks.
#[derive(Debug, Default)]
pub struct Scene {
    foreground_tracks: Vec<Track>,
    background_tracks: Vec<Track>,
}

impl Scene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_foreground_track(&mut self, track: Track) {
        self.foreground_tracks.push(track);
    }

    pub fn add_background_track(&mut self, track: Track) {
        self.background_tracks.push(track);
    }

    /// Tracks of moving objects.
    pub fn foreground_tracks(&self) -> &[Track] {
        &self.foreground_tracks
    }

    pub fn foreground_tracks_mut(&mut self) -> &mut [Track] {
        &mut self.foreground_tracks
    }

    /// Tracks of static background objects.
    pub fn background_tracks(&self) -> &[Track] {
        &self.background_tracks
    }

    pub fn background_tracks_mut(&mut self) -> &mut [Track] {
        &mut self.background_tracks
    }

    /// Iterate over foreground then background tracks.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.foreground_tracks
            .iter()
            .chain(self.background_tracks.iter())
    }

    /// Foreground or background track with `track_id`.
    pub fn track(&self, track_id: u64) -> Option<&Track> {
        self.tracks().find(|t| t.track_id() == track_id)
    }

    pub fn track_mut(&mut self, track_id: u64) -> Option<&mut Track> {
        self.foreground_tracks
            .iter_mut()
            .chain(self.background_tracks.iter_mut())
            .find(|t| t.track_id() == track_id)
    }

    /// Drop every track marked dead. Returns how many were removed.
    pub fn remove_dead_tracks(&mut self) -> usize {
        let before = self.len();
        for tracks in [&mut self.foreground_tracks, &mut self.background_tracks] {
            tracks.retain(|t| {
                if !t.is_alive() {
                    debug!(track_id = t.track_id(), "removing dead track");
                }
                t.is_alive()
            });
        }
        before - self.len()
    }

    /// Number of tracks in both sets.
    pub fn len(&self) -> usize {
        self.foreground_tracks.len() + self.background_tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
