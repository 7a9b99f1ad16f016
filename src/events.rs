use std::collections::VecDeque;

use bevy::prelude::*;

use crate::character::CharacterId;
use crate::entity::EntityId;
use crate::run::RunEvent;
use crate::runtime::ActiveRun;

const FEED_CAPACITY: usize = 512;

/// Everything downstream systems can observe about a run: lifecycle
/// markers plus the simulation's own events, untranslated.
#[derive(Clone, Debug, PartialEq)]
pub enum BusEvent {
    RunStarted {
        character: CharacterId,
        restart: bool,
    },
    Run(RunEvent),
    RunExit,
}

/// One feed entry: the event, the app frame it was published on, and the
/// entity it came from when the run knows one.
#[derive(Clone, Debug)]
pub struct FeedEntry {
    pub frame: u64,
    pub source: Option<EntityId>,
    pub event: BusEvent,
}

/// Rolling feed of typed run events. The driver is the only writer;
/// presentation readers walk it with their own frame cursors, so entries
/// stay put until capacity pushes them out the front.
#[derive(Resource)]
pub struct EventFeed {
    entries: VecDeque<FeedEntry>,
    frame: u64,
    dropped: u64,
    next_drop_report: u64,
}

impl Default for EventFeed {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(FEED_CAPACITY),
            frame: 0,
            dropped: 0,
            next_drop_report: 1,
        }
    }
}

impl EventFeed {
    pub fn publish(&mut self, event: BusEvent, source: Option<EntityId>) {
        if self.entries.len() == FEED_CAPACITY {
            self.entries.pop_front();
            self.dropped += 1;
            // Drop reports follow a doubling schedule: the 1st, 2nd, 4th,
            // 8th drop and so on.
            if self.dropped >= self.next_drop_report {
                self.next_drop_report = self.dropped.saturating_mul(2);
                warn!(
                    "[Ravine events] Feed full, oldest entry dropped ({} total)",
                    self.dropped
                );
            }
        }
        self.entries.push_back(FeedEntry {
            frame: self.frame,
            source,
            event,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedEntry> + '_ {
        self.entries.iter()
    }

    pub fn advance_frame(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }
}

pub struct EventFeedPlugin;

impl Plugin for EventFeedPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventFeed>().add_systems(
            FixedUpdate,
            advance_feed_frame.run_if(resource_exists::<ActiveRun>),
        );
    }
}

fn advance_feed_frame(mut feed: ResMut<EventFeed>) {
    feed.advance_frame();
}
