//! RGBA sprites, nearest-neighbor scaling and the scaled-variant cache

use std::collections::HashMap;

use crate::pickups::PickupKind;

/// An RGBA image, 4 bytes per pixel, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Sprite {
    /// Wrap raw RGBA data. Returns `None` if the length does not match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize * 4).then_some(Self { width, height, pixels })
    }

    /// A single-color block from an ARGB value
    pub fn solid(width: u32, height: u32, argb: u32) -> Self {
        let texel = argb_to_rgba(argb);
        let pixels = texel.repeat(width as usize * height as usize);
        Self { width, height, pixels }
    }

    /// Vertical stripes: `stripe` pixels of `accent` every `2 * stripe` columns
    pub fn striped(width: u32, height: u32, base: u32, accent: u32, stripe: u32) -> Self {
        let stripe = stripe.max(1);
        let mut sprite = Self::solid(width, height, base);
        let accent = argb_to_rgba(accent);
        for y in 0..height {
            for x in (0..width).filter(|x| x % (stripe * 2) < stripe) {
                let idx = (y * width + x) as usize * 4;
                sprite.pixels[idx..idx + 4].copy_from_slice(&accent);
            }
        }
        sprite
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Nearest-neighbor resample to `width` × `height`
    pub fn scaled(&self, width: u32, height: u32) -> Sprite {
        if self.width == 0 || self.height == 0 {
            return Sprite::solid(width, height, 0);
        }
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for dy in 0..height {
            let sy = (dy as u64 * self.height as u64 / height as u64) as u32;
            for dx in 0..width {
                let sx = (dx as u64 * self.width as u64 / width as u64) as u32;
                let idx = (sy * self.width + sx) as usize * 4;
                pixels.extend_from_slice(&self.pixels[idx..idx + 4]);
            }
        }
        Sprite { width, height, pixels }
    }
}

fn argb_to_rgba(argb: u32) -> [u8; 4] {
    [
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
        (argb >> 24) as u8,
    ]
}

/// A source sprite plus its scaled variants, keyed by pixel size
#[derive(Debug, Clone)]
pub struct ScaleCache {
    source: Sprite,
    scaled: HashMap<(u32, u32), Sprite>,
}

impl ScaleCache {
    pub fn new(source: Sprite) -> Self {
        Self {
            source,
            scaled: HashMap::new(),
        }
    }

    pub fn source(&self) -> &Sprite {
        &self.source
    }

    /// The source scaled to `width` × `height`, computed once per size.
    pub fn get(&mut self, width: u32, height: u32) -> &Sprite {
        let source = &self.source;
        let cached = self.scaled.len();
        self.scaled.entry((width, height)).or_insert_with(|| {
            tracing::trace!("Caching {}x{} sprite variant ({} cached)", width, height, cached + 1);
            source.scaled(width, height)
        })
    }

    pub fn len(&self) -> usize {
        self.scaled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scaled.is_empty()
    }
}

/// Images for everything the renderer draws. Missing slots fall back to
/// solid rectangles.
#[derive(Debug, Clone, Default)]
pub struct SpriteSet {
    pub player: Option<Sprite>,
    pub opponent: Option<Sprite>,
    pub boost: Option<Sprite>,
    pub oil: Option<Sprite>,
    pub shell: Option<Sprite>,
}

impl SpriteSet {
    /// Blocky striped stand-ins for real artwork
    pub fn placeholders() -> Self {
        Self {
            player: Some(Sprite::striped(32, 32, 0xFF0000FF, 0xFFFFFFFF, 4)),
            opponent: Some(Sprite::striped(32, 32, 0xFFFF0000, 0xFFFFFFFF, 4)),
            boost: Some(Sprite::striped(16, 16, 0xFFFFFF00, 0xFFFFFFFF, 4)),
            oil: Some(Sprite::striped(16, 16, 0xFF000000, 0xFF505050, 4)),
            shell: Some(Sprite::striped(16, 16, 0xFFFF0000, 0xFFFFFFFF, 4)),
        }
    }

    pub fn item(&self, kind: PickupKind) -> Option<&Sprite> {
        match kind {
            PickupKind::Boost => self.boost.as_ref(),
            PickupKind::Oil => self.oil.as_ref(),
            PickupKind::Shell => self.shell.as_ref(),
        }
    }
}
