use overworld::{Direction, StepInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Run,
    Quit,
}

const ACTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Run => 4,
            InputAction::Quit => 5,
        }
    }
}

/// Input state handed to one simulation tick.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct InputSnapshot {
    quit_requested: bool,
    toggle_surf_pressed: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub(crate) fn new(
        quit_requested: bool,
        toggle_surf_pressed: bool,
        actions: ActionStates,
    ) -> Self {
        Self {
            quit_requested,
            toggle_surf_pressed,
            actions,
        }
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn running(&self) -> bool {
        self.actions.is_down(InputAction::Run)
    }

    /// Held movement keys folded into one direction. Opposite keys cancel;
    /// one vertical plus one horizontal key gives a diagonal.
    pub(crate) fn direction(&self) -> Option<Direction> {
        let vertical = axis(
            self.actions.is_down(InputAction::MoveUp),
            self.actions.is_down(InputAction::MoveDown),
            Direction::North,
            Direction::South,
        );
        let horizontal = axis(
            self.actions.is_down(InputAction::MoveLeft),
            self.actions.is_down(InputAction::MoveRight),
            Direction::West,
            Direction::East,
        );
        Direction::from_axes(vertical, horizontal)
    }

    pub(crate) fn step_input(&self) -> StepInput {
        StepInput {
            direction: self.direction(),
            running: self.running(),
            toggle_surf: self.toggle_surf_pressed,
        }
    }
}

fn axis(
    negative: bool,
    positive: bool,
    towards_negative: Direction,
    towards_positive: Direction,
) -> Option<Direction> {
    match (negative, positive) {
        (true, false) => Some(towards_negative),
        (false, true) => Some(towards_positive),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(actions: &[InputAction]) -> InputSnapshot {
        let mut states = ActionStates::default();
        for action in actions {
            states.set(*action, true);
        }
        InputSnapshot::new(false, false, states)
    }

    #[test]
    fn no_keys_means_no_direction() {
        assert_eq!(snapshot_with(&[]).direction(), None);
    }

    #[test]
    fn single_key_maps_to_cardinal() {
        assert_eq!(
            snapshot_with(&[InputAction::MoveUp]).direction(),
            Some(Direction::North)
        );
        assert_eq!(
            snapshot_with(&[InputAction::MoveRight]).direction(),
            Some(Direction::East)
        );
    }

    #[test]
    fn two_axes_make_a_diagonal() {
        assert_eq!(
            snapshot_with(&[InputAction::MoveDown, InputAction::MoveLeft]).direction(),
            Some(Direction::Southwest)
        );
        assert_eq!(
            snapshot_with(&[InputAction::MoveUp, InputAction::MoveRight]).direction(),
            Some(Direction::Northeast)
        );
    }

    #[test]
    fn opposite_keys_cancel_on_their_axis() {
        assert_eq!(
            snapshot_with(&[InputAction::MoveUp, InputAction::MoveDown]).direction(),
            None
        );
        assert_eq!(
            snapshot_with(&[
                InputAction::MoveLeft,
                InputAction::MoveRight,
                InputAction::MoveDown
            ])
            .direction(),
            Some(Direction::South)
        );
    }

    #[test]
    fn run_is_a_held_modifier() {
        assert!(snapshot_with(&[InputAction::Run]).running());
        assert!(!snapshot_with(&[InputAction::MoveUp]).running());
    }
}
