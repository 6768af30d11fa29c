/// SR3D Web - WASM front end for the software renderer
///
/// The page owns the animation loop: it forwards key events, calls `frame`
/// with the elapsed time and `draw` to blit the pixel buffer into a canvas.

use sr3d_core::{
    BottomUp, Engine, EngineConfig, EngineError, FpsCounter, Key, KeySet, Mesh, PixelBuffer,
    Surface, Vector3D,
};
use std::time::Duration;
use wasm_bindgen::{prelude::*, Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Models are placed this far in front of the camera
const MODEL_DISTANCE: f32 = 100.0;

#[wasm_bindgen]
pub struct WebRenderer {
    engine: Engine,
    pixels: BottomUp<PixelBuffer>,
    keys: KeySet,
    fps: FpsCounter,
}

#[wasm_bindgen]
impl WebRenderer {
    #[wasm_bindgen(constructor)]
    pub fn new(width: usize, height: usize) -> Result<WebRenderer, JsValue> {
        let config = EngineConfig::default().with_viewport(width, height);
        let engine = Engine::new(config, placed(Mesh::cube(40.0))).map_err(to_js)?;
        Ok(WebRenderer {
            engine,
            pixels: BottomUp(PixelBuffer::new(width, height)),
            keys: KeySet::new(),
            fps: FpsCounter::new(),
        })
    }

    /// Replace the model with OBJ text. Returns the number of triangles
    /// loaded; reading stops at the first bad line.
    #[wasm_bindgen(js_name = loadObj)]
    pub fn load_obj(&mut self, text: &str) -> usize {
        let mesh = Mesh::from_obj_str(text);
        let count = mesh.len();
        self.engine.set_mesh(placed(mesh));
        count
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), JsValue> {
        self.engine.resize(width, height).map_err(to_js)?;
        self.pixels.inner_mut().resize(width, height);
        Ok(())
    }

    /// `code` is a `KeyboardEvent.code`. Returns whether the key is bound.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, code: &str) -> bool {
        match map_code(code) {
            Some(key) => {
                self.keys.press(key);
                true
            }
            None => false,
        }
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&self, code: &str) -> bool {
        match map_code(code) {
            Some(key) => {
                self.keys.release(key);
                true
            }
            None => false,
        }
    }

    /// Window lost focus; no key-up events will arrive.
    #[wasm_bindgen(js_name = releaseKeys)]
    pub fn release_keys(&self) {
        self.keys.release_all();
    }

    /// Advance one frame; `dt` is the elapsed time in seconds.
    pub fn frame(&mut self, dt: f32) -> Result<(), JsValue> {
        self.step(dt).map_err(to_js)
    }

    /// Blit the pixel buffer into the canvas with id `canvas_id`.
    pub fn draw(&self, canvas_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()?;

        let buffer = self.pixels.inner();
        let (width, height) = (buffer.width() as u32, buffer.height() as u32);
        if canvas.width() != width || canvas.height() != height {
            canvas.set_width(width);
            canvas.set_height(height);
        }

        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let rgba = buffer.to_rgba();
        let image =
            ImageData::new_with_u8_clamped_array_and_sh(Clamped(rgba.as_slice()), width, height)?;
        context.put_image_data(&image, 0.0, 0.0)
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    #[wasm_bindgen(js_name = triangleCount)]
    pub fn triangle_count(&self) -> usize {
        self.engine.mesh().len()
    }
}

impl WebRenderer {
    fn step(&mut self, dt: f32) -> Result<(), EngineError> {
        self.engine.advance(dt, &self.keys, &mut self.pixels)?;
        // Negative, NaN or huge frame times from the page are not counted
        if let Ok(frame_time) = Duration::try_from_secs_f32(dt) {
            self.fps.tick(frame_time);
        }
        Ok(())
    }

    pub fn pixels(&self) -> &PixelBuffer {
        self.pixels.inner()
    }
}

fn placed(mut mesh: Mesh) -> Mesh {
    mesh.position = Vector3D::new(0.0, 0.0, -MODEL_DISTANCE);
    mesh
}

fn to_js(e: EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASD moves, arrows look around
pub fn map_code(code: &str) -> Option<Key> {
    let key = match code {
        "KeyW" => Key::Forward,
        "KeyS" => Key::Back,
        "KeyA" => Key::Left,
        "KeyD" => Key::Right,
        "ArrowUp" => Key::LookUp,
        "ArrowDown" => Key::LookDown,
        "ArrowLeft" => Key::LookLeft,
        "ArrowRight" => Key::LookRight,
        _ => return None,
    };
    Some(key)
}

/// Route `log` records to the browser console.
#[wasm_bindgen(start)]
pub fn main() {
    let _ = console_log::init_with_level(log::Level::Info);
}
