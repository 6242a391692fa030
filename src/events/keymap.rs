use std::fmt;

/// Размер битовой карты клавиатуры X11 (256 кодов клавиш, по биту на код)
pub const KEYMAP_SIZE: usize = 32;

/// В X11 коды клавиш сдвинуты относительно evdev на 8
const X_KEYCODE_OFFSET: u8 = 8;

/// Битовая карта кодов клавиш X11.
///
/// Используется и как снимок нажатых клавиш (`QueryKeymap`), и как маска
/// клавиш, нажатие которых считается набором текста.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBits([u8; KEYMAP_SIZE]);

/// Снимок состояния клавиатуры: установленный бит означает нажатую клавишу
pub type KeyStateSnapshot = KeyBits;

/// Маска клавиш: сброшенный бит исключает клавишу из учёта активности
pub type ModifierMask = KeyBits;

impl KeyBits {
    pub const fn empty() -> Self {
        Self([0x00; KEYMAP_SIZE])
    }

    pub const fn full() -> Self {
        Self([0xff; KEYMAP_SIZE])
    }

    pub const fn from_bytes(bytes: [u8; KEYMAP_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn set(&mut self, keycode: u8) {
        self.0[usize::from(keycode / 8)] |= 1 << (keycode % 8);
    }

    pub fn clear(&mut self, keycode: u8) {
        self.0[usize::from(keycode / 8)] &= !(1 << (keycode % 8));
    }

    pub fn contains(&self, keycode: u8) -> bool {
        self.0[usize::from(keycode / 8)] & (1 << (keycode % 8)) != 0
    }

    /// Первая клавиша, нажатая в `self`, отпущенная в `previous` и не исключённая маской
    pub fn first_fresh_press(&self, previous: &KeyBits, mask: &ModifierMask) -> Option<u8> {
        self.0
            .iter()
            .zip(previous.0.iter())
            .zip(mask.0.iter())
            .enumerate()
            .find_map(|(index, ((current, previous), mask))| {
                let fresh = current & !previous & mask;
                (fresh != 0).then(|| (index * 8) as u8 + fresh.trailing_zeros() as u8)
            })
    }

    /// Есть ли нажатая клавиша, которую маска исключает (например, удерживаемый модификатор)
    pub fn holds_excluded(&self, mask: &ModifierMask) -> bool {
        self.0
            .iter()
            .zip(mask.0.iter())
            .any(|(current, mask)| current & !mask != 0)
    }

    /// Коды всех установленных битов по возрастанию
    pub fn keycodes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |keycode| self.contains(*keycode))
    }
}

impl Default for KeyBits {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for KeyBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keycodes()).finish()
    }
}

/// Человекочитаемое имя клавиши по коду X11 (через таблицу evdev)
pub fn key_name(keycode: u8) -> String {
    if keycode < X_KEYCODE_OFFSET {
        return format!("keycode {}", keycode);
    }

    let code = evdev::KeyCode::new(u16::from(keycode - X_KEYCODE_OFFSET));
    format!("{:?}", code)
}
