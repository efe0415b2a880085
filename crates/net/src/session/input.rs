use bitflags::bitflags;
use glam::Vec3;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClientInput: u16 {
        const ATTACK = 1 << 0;
        const DODGE = 1 << 1;
        const BLOCK = 1 << 2;
        const FORWARD = 1 << 3;
        const BACK = 1 << 4;
        const LEFT = 1 << 5;
        const RIGHT = 1 << 6;
        const SPRINT = 1 << 9;
    }
}

/// Controls carried by every outbound client snapshot. Angles are degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub weapon: u8,
    pub yaw: f32,
    pub pitch: f32,
    pub buttons: ClientInput,
}

impl InputState {
    pub fn press(&mut self, input: ClientInput) {
        self.buttons.insert(input);
    }

    pub fn release(&mut self, input: ClientInput) {
        self.buttons.remove(input);
    }

    pub fn clear(&mut self) {
        self.buttons = ClientInput::empty();
    }

    /// Faces `target` from `origin` and holds forward.
    pub fn move_towards(&mut self, origin: Vec3, target: Vec3) {
        let delta = target - origin;
        self.yaw = (-delta.x).atan2(delta.y).to_degrees();
        self.pitch = delta.z.atan2(delta.x.hypot(delta.y)).to_degrees();
        self.press(ClientInput::FORWARD);
    }
}
