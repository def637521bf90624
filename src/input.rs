use winit::event::{ElementState, VirtualKeyCode, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Close,
}

pub fn command_for_key(state: ElementState, key: Option<VirtualKeyCode>) -> Option<Command> {
    match (state, key) {
        (ElementState::Pressed, Some(VirtualKeyCode::Escape)) => Some(Command::Close),
        _ => None,
    }
}

pub fn command_for_event(event: &WindowEvent<'_>) -> Option<Command> {
    match event {
        WindowEvent::CloseRequested => Some(Command::Close),
        WindowEvent::KeyboardInput { input, .. } => {
            command_for_key(input.state, input.virtual_keycode)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::{DeviceId, KeyboardInput};

    #[allow(deprecated)]
    fn key_event(state: ElementState, key: VirtualKeyCode) -> WindowEvent<'static> {
        WindowEvent::KeyboardInput {
            device_id: unsafe { DeviceId::dummy() },
            input: KeyboardInput {
                scancode: 0,
                state,
                virtual_keycode: Some(key),
                modifiers: Default::default(),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn escape_press_closes() {
        assert_eq!(
            command_for_key(ElementState::Pressed, Some(VirtualKeyCode::Escape)),
            Some(Command::Close)
        );
    }

    #[test]
    fn other_keys_and_releases_are_ignored() {
        assert_eq!(
            command_for_key(ElementState::Released, Some(VirtualKeyCode::Escape)),
            None
        );
        assert_eq!(
            command_for_key(ElementState::Pressed, Some(VirtualKeyCode::Space)),
            None
        );
        assert_eq!(command_for_key(ElementState::Pressed, None), None);
    }

    #[test]
    fn close_request_closes() {
        assert_eq!(
            command_for_event(&WindowEvent::CloseRequested),
            Some(Command::Close)
        );
        assert_eq!(command_for_event(&WindowEvent::Focused(true)), None);
    }

    #[test]
    fn escape_key_event_closes_on_press_only() {
        assert_eq!(
            command_for_event(&key_event(ElementState::Pressed, VirtualKeyCode::Escape)),
            Some(Command::Close)
        );
        assert_eq!(
            command_for_event(&key_event(ElementState::Released, VirtualKeyCode::Escape)),
            None
        );
        assert_eq!(
            command_for_event(&key_event(ElementState::Pressed, VirtualKeyCode::Q)),
            None
        );
    }
}
