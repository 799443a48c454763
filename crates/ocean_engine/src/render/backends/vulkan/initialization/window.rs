//! GLFW window
//!
//! The window is the engine's surface provider: it creates the Vulkan
//! surface, reports the framebuffer size and raises a resize flag whenever
//! GLFW delivers a framebuffer-size event. Escape and Q close it.

use ash::{vk, Instance};
use glfw::{Action, Key, WindowEvent};
use thiserror::Error;

use super::context::SurfaceSource;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::frame_scheduler::SurfaceProvider;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// GLFW has no Vulkan loader available
    #[error("Vulkan is not supported by the window system")]
    VulkanUnsupported,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

fn log_glfw_error(error: glfw::Error, description: String) {
    log::error!("GLFW error {:?}: {}", error, description);
}

/// GLFW window without a client API, set up for Vulkan rendering
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
    resize_requested: bool,
}

impl Window {
    /// Create a resizable window
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(log_glfw_error).map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::VulkanUnsupported);
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_framebuffer_size_polling(true);
        log::info!("Window '{}' created at {}x{}", title, width, height);

        Ok(Self {
            glfw,
            window,
            events,
            resize_requested: false,
        })
    }

    /// Request the window to close
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::FramebufferSize(width, height) => {
                log::debug!("Framebuffer resized to {}x{}", width, height);
                self.resize_requested = true;
            }
            WindowEvent::Key(Key::Escape | Key::Q, _, Action::Press, _) => {
                self.window.set_should_close(true);
            }
            _ => {}
        }
    }
}

impl SurfaceProvider for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0))
    }

    fn take_resize_request(&mut self) -> bool {
        std::mem::take(&mut self.resize_requested)
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
        let events: Vec<WindowEvent> = glfw::flush_messages(&self.events).map(|(_, event)| event).collect();
        for event in &events {
            self.handle_event(event);
        }
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }
}

impl SurfaceSource for Window {
    fn required_instance_extensions(&self) -> VulkanResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| VulkanError::Window("GLFW reported no Vulkan instance extensions".to_string()))
    }

    fn create_surface(&mut self, instance: &Instance) -> VulkanResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance.handle(), std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(VulkanError::init("window surface")(result))
        }
    }
}
