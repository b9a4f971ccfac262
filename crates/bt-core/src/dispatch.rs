//! The dispatch table: which transition each signal triggers.
//!
//! Every signal maps to exactly one [`Transition`], and every transition
//! except `Ignore` to a fixed [`Plan`]. The tracker executes a plan in one order only:
//! close the open interval, then decide the next one, then persist both.
//!
//! | Transition   | Reconcile | Next                                   |
//! |--------------|-----------|----------------------------------------|
//! | `TabSwitch`  | close     | track the tab looked up by id          |
//! | `TabLoaded`  | close     | track the updated tab                  |
//! | `FocusLost`  | close     | clear                                  |
//! | `FocusGained`| close     | track the focused window's active tab  |
//! | `Idle`       | close     | clear                                  |
//! | `Resume`     | close     | track the active tab                   |
//! | `Restart`    | discard   | track the active tab if the user is active |
//! | `Ignore`     | none      | none; the state is not touched         |

use crate::entry::{Tab, TabId, WindowId};
use crate::signal::{LoadStatus, Signal};

/// One row of the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    TabSwitch { tab_id: TabId },
    TabLoaded { tab: Tab },
    FocusLost,
    FocusGained { window_id: WindowId },
    Idle,
    Resume,
    Restart,
    /// A tab update that is not a completed load of the active tab.
    Ignore,
}

/// What happens to the open interval before the next one is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Fold it into history at the signal's timestamp.
    Close,
    /// Drop it without recording.
    Discard,
}

/// Where the next tab to track comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Look the tab up by id.
    Tab(TabId),
    /// The signal already carries the tab.
    Given(Tab),
    /// The active tab of a window, or of the current window.
    ActiveTab(Option<WindowId>),
    /// The current window's active tab, but only if the user is not idle.
    ActiveTabIfUserActive,
}

/// What becomes the open interval after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Clear,
    Track(Target),
}

/// The full action for a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub reconcile: Reconcile,
    pub next: Next,
}

impl Transition {
    /// Classifies a host signal.
    pub fn from_signal(signal: Signal) -> Self {
        match signal {
            Signal::TabActivated { tab_id, .. } => Self::TabSwitch { tab_id },
            Signal::TabUpdated {
                change_info, tab, ..
            } => {
                if change_info.status == Some(LoadStatus::Complete) && tab.active {
                    Self::TabLoaded { tab }
                } else {
                    Self::Ignore
                }
            }
            Signal::WindowFocusChanged { window_id } if window_id.is_none() => Self::FocusLost,
            Signal::WindowFocusChanged { window_id } => Self::FocusGained { window_id },
            Signal::IdleStateChanged { state } if state.is_away() => Self::Idle,
            Signal::IdleStateChanged { .. } => Self::Resume,
            Signal::Startup { .. } => Self::Restart,
        }
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TabSwitch { .. } => "tab_switch",
            Self::TabLoaded { .. } => "tab_loaded",
            Self::FocusLost => "focus_lost",
            Self::FocusGained { .. } => "focus_gained",
            Self::Idle => "idle",
            Self::Resume => "resume",
            Self::Restart => "restart",
            Self::Ignore => "ignore",
        }
    }

    /// Looks up this transition's row in the dispatch table. `Ignore` has
    /// no plan.
    pub fn plan(self) -> Option<Plan> {
        let (reconcile, next) = match self {
            Self::TabSwitch { tab_id } => (Reconcile::Close, Next::Track(Target::Tab(tab_id))),
            Self::TabLoaded { tab } => (Reconcile::Close, Next::Track(Target::Given(tab))),
            Self::FocusLost | Self::Idle => (Reconcile::Close, Next::Clear),
            Self::FocusGained { window_id } => (
                Reconcile::Close,
                Next::Track(Target::ActiveTab(Some(window_id))),
            ),
            Self::Resume => (Reconcile::Close, Next::Track(Target::ActiveTab(None))),
            Self::Restart => (
                Reconcile::Discard,
                Next::Track(Target::ActiveTabIfUserActive),
            ),
            Self::Ignore => return None,
        };
        Some(Plan { reconcile, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{ChangeInfo, IdleState, StartupReason};

    fn tab(active: bool) -> Tab {
        Tab {
            id: TabId(7),
            window_id: Some(WindowId(1)),
            url: Some("https://a.com".to_string()),
            title: Some("A".to_string()),
            active,
        }
    }

    fn updated(status: Option<LoadStatus>, active: bool) -> Signal {
        Signal::TabUpdated {
            tab_id: TabId(7),
            change_info: ChangeInfo { status },
            tab: tab(active),
        }
    }

    #[test]
    fn tab_update_needs_complete_and_active() {
        assert_eq!(
            Transition::from_signal(updated(Some(LoadStatus::Complete), true)),
            Transition::TabLoaded { tab: tab(true) }
        );
        assert_eq!(
            Transition::from_signal(updated(Some(LoadStatus::Loading), true)),
            Transition::Ignore
        );
        assert_eq!(
            Transition::from_signal(updated(Some(LoadStatus::Complete), false)),
            Transition::Ignore
        );
        assert_eq!(
            Transition::from_signal(updated(None, true)),
            Transition::Ignore
        );
    }

    #[test]
    fn focus_sentinel_means_lost() {
        assert_eq!(
            Transition::from_signal(Signal::WindowFocusChanged {
                window_id: WindowId::NONE
            }),
            Transition::FocusLost
        );
        assert_eq!(
            Transition::from_signal(Signal::WindowFocusChanged {
                window_id: WindowId(2)
            }),
            Transition::FocusGained {
                window_id: WindowId(2)
            }
        );
    }

    #[test]
    fn idle_and_locked_both_stop() {
        for state in [IdleState::Idle, IdleState::Locked] {
            let transition = Transition::from_signal(Signal::IdleStateChanged { state });
            assert_eq!(transition, Transition::Idle);
            assert_eq!(
                transition.plan().unwrap(),
                Plan {
                    reconcile: Reconcile::Close,
                    next: Next::Clear
                }
            );
        }
        assert_eq!(
            Transition::from_signal(Signal::IdleStateChanged {
                state: IdleState::Active
            }),
            Transition::Resume
        );
    }

    #[test]
    fn every_tracking_row_reconciles_first() {
        let rows = [
            Transition::TabSwitch { tab_id: TabId(1) },
            Transition::TabLoaded { tab: tab(true) },
            Transition::FocusLost,
            Transition::FocusGained {
                window_id: WindowId(1),
            },
            Transition::Idle,
            Transition::Resume,
        ];
        for row in rows {
            let name = row.name();
            assert_eq!(row.plan().unwrap().reconcile, Reconcile::Close, "{name}");
        }
    }

    #[test]
    fn restart_discards_instead_of_reconciling() {
        for reason in [
            StartupReason::Startup,
            StartupReason::Installed,
            StartupReason::Updated,
            StartupReason::Wake,
        ] {
            let plan = Transition::from_signal(Signal::Startup { reason })
                .plan()
                .unwrap();
            assert_eq!(plan.reconcile, Reconcile::Discard);
            assert_eq!(plan.next, Next::Track(Target::ActiveTabIfUserActive));
        }
    }

    #[test]
    fn ignored_updates_have_no_plan() {
        let transition = Transition::from_signal(updated(Some(LoadStatus::Loading), true));
        assert!(transition.plan().is_none());
    }
}
