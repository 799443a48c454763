//! Frame scheduler
//!
//! Drives the per-frame protocol over a fixed ring of frame slots:
//!
//! 1. wait on the slot's in-flight fence
//! 2. acquire a swapchain image (out of date: rebuild and skip the frame)
//! 3. reset fence and command buffer, record the frame
//! 4. write the slot's persistently mapped uniform buffer
//! 5. submit, signalling render-finished and the slot's fence
//! 6. present, then rebuild if the surface changed or a resize was flagged
//! 7. advance the frame counter
//!
//! The scheduler is written against two seams. [`SurfaceProvider`] is the
//! windowing side (framebuffer size, resize flag, event pump) and
//! [`FrameBackend`] is the GPU side of each step. The Vulkan renderer
//! implements `FrameBackend`; tests drive the state machine with mocks.

use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::uniforms::FrameInput;

/// Windowing collaborator consumed by the scheduler
pub trait SurfaceProvider {
    /// Current framebuffer size in pixels; `(0, 0)` while minimized
    fn framebuffer_size(&self) -> (u32, u32);

    /// Read and clear the "resize requested" flag
    fn take_resize_request(&mut self) -> bool;

    /// Process pending window events
    fn poll_events(&mut self);

    /// Whether the user asked to close the window
    fn should_close(&self) -> bool;
}

/// Result of acquiring a presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Image acquired; `suboptimal` images are still rendered
    Ready {
        /// Swapchain image index
        image_index: u32,
        /// Swapchain no longer matches the surface exactly
        suboptimal: bool,
    },
    /// Swapchain is unusable and must be rebuilt
    OutOfDate,
}

/// Result of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Presented and the swapchain still matches the surface
    Presented,
    /// Presented but the swapchain should be rebuilt
    Suboptimal,
    /// Not presented; the swapchain must be rebuilt
    OutOfDate,
}

impl PresentOutcome {
    const fn needs_rebuild(self) -> bool {
        !matches!(self, Self::Presented)
    }
}

/// GPU side of the frame protocol, one method per step
pub trait FrameBackend {
    /// Number of frame slots the backend allocated
    fn frames_in_flight(&self) -> usize;

    /// Block until the slot's previous submission has completed
    fn wait_for_slot(&mut self, slot: usize) -> VulkanResult<()>;

    /// Acquire the next image, signalling the slot's image-available semaphore
    fn acquire_image(&mut self, slot: usize) -> VulkanResult<AcquireOutcome>;

    /// Reset the slot's fence and command buffer, then record drawing into `image_index`
    fn record_commands(&mut self, slot: usize, image_index: u32) -> VulkanResult<()>;

    /// Write the slot's uniform buffer in place
    fn update_uniforms(&mut self, slot: usize, input: &FrameInput) -> VulkanResult<()>;

    /// Submit the slot's command buffer
    fn submit(&mut self, slot: usize) -> VulkanResult<()>;

    /// Present `image_index` once the slot's render-finished semaphore fires
    fn present(&mut self, slot: usize, image_index: u32) -> VulkanResult<PresentOutcome>;

    /// Tear down and recreate every swapchain-dependent object
    ///
    /// Called only after [`FrameBackend::wait_idle`] and with a nonzero size.
    fn rebuild_swapchain(&mut self, framebuffer_size: (u32, u32)) -> VulkanResult<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&mut self) -> VulkanResult<()>;
}

/// Where a frame slot is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// No GPU work pending on the slot
    #[default]
    Idle,
    /// Waiting for a swapchain image
    Acquiring,
    /// Commands and uniforms being written
    Recording,
    /// Command buffer handed to the queue
    Submitted,
    /// Present request issued; held until the slot's fence is waited on
    Presenting,
}

/// What happened in one call to [`FrameScheduler::draw_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Frame presented, nothing else to do
    Presented,
    /// Frame presented and the swapchain was rebuilt afterwards
    PresentedAndRebuilt,
    /// Acquire reported out of date; swapchain rebuilt, frame not counted
    Skipped,
}

/// Counters kept across the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Frames that reached the present step
    pub frames_presented: u64,
    /// Frames abandoned at acquire
    pub frames_skipped: u64,
    /// Completed swapchain rebuilds
    pub rebuilds: u64,
}

/// Render loop state machine
#[derive(Debug)]
pub struct FrameScheduler {
    frame_count: u64,
    slots: Vec<SlotState>,
    stats: SchedulerStats,
}

impl FrameScheduler {
    /// Scheduler cycling over `frames_in_flight` slots
    pub fn new(frames_in_flight: usize) -> Self {
        Self {
            frame_count: 0,
            slots: vec![SlotState::Idle; frames_in_flight.max(1)],
            stats: SchedulerStats::default(),
        }
    }

    /// Scheduler sized to the backend's slot count
    pub fn for_backend(backend: &impl FrameBackend) -> Self {
        Self::new(backend.frames_in_flight())
    }

    /// Frames completed so far
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Slot the next frame will use
    pub fn current_slot(&self) -> usize {
        (self.frame_count % self.slots.len() as u64) as usize
    }

    /// State of every slot
    pub fn slot_states(&self) -> &[SlotState] {
        &self.slots
    }

    /// Loop counters
    pub const fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run one iteration of the frame protocol
    pub fn draw_frame<B, S>(&mut self, backend: &mut B, surface: &mut S, input: &FrameInput) -> VulkanResult<FrameOutcome>
    where
        B: FrameBackend,
        S: SurfaceProvider,
    {
        let slot = self.current_slot();

        backend.wait_for_slot(slot)?;
        self.slots[slot] = SlotState::Acquiring;

        let acquired = match backend.acquire_image(slot) {
            Err(VulkanError::SurfaceInvalidated) => AcquireOutcome::OutOfDate,
            other => other?,
        };
        let image_index = match acquired {
            AcquireOutcome::Ready { image_index, suboptimal } => {
                if suboptimal {
                    log::trace!("Acquired suboptimal image {image_index}, rendering anyway");
                }
                image_index
            }
            AcquireOutcome::OutOfDate => {
                log::debug!("Swapchain out of date at acquire, rebuilding");
                self.slots[slot] = SlotState::Idle;
                self.stats.frames_skipped += 1;
                self.rebuild(backend, surface)?;
                return Ok(FrameOutcome::Skipped);
            }
        };

        self.slots[slot] = SlotState::Recording;
        backend.record_commands(slot, image_index)?;
        backend.update_uniforms(slot, input)?;

        backend.submit(slot)?;
        self.slots[slot] = SlotState::Submitted;

        let presented = match backend.present(slot, image_index) {
            Err(VulkanError::SurfaceInvalidated) => PresentOutcome::OutOfDate,
            other => other?,
        };
        // stays in flight until the next wait on this slot's fence
        self.slots[slot] = SlotState::Presenting;
        self.stats.frames_presented += 1;

        let resize_requested = surface.take_resize_request();
        let rebuilt = if presented.needs_rebuild() || resize_requested {
            log::debug!("Rebuilding swapchain after present ({presented:?}, resize requested: {resize_requested})");
            self.rebuild(backend, surface)?
        } else {
            false
        };

        self.frame_count += 1;
        Ok(if rebuilt {
            FrameOutcome::PresentedAndRebuilt
        } else {
            FrameOutcome::Presented
        })
    }

    /// Rebuild the swapchain once the surface has a drawable size
    ///
    /// Busy-polls the surface while it reports a zero size. Returns `false`
    /// without rebuilding if the window is closed while minimized. A pending
    /// resize request is consumed, since the new swapchain already matches
    /// the current size.
    pub fn rebuild<B, S>(&mut self, backend: &mut B, surface: &mut S) -> VulkanResult<bool>
    where
        B: FrameBackend,
        S: SurfaceProvider,
    {
        let mut size = surface.framebuffer_size();
        while size.0 == 0 || size.1 == 0 {
            if surface.should_close() {
                return Ok(false);
            }
            surface.poll_events();
            size = surface.framebuffer_size();
        }

        surface.take_resize_request();
        backend.wait_idle()?;
        self.mark_all_idle();
        backend.rebuild_swapchain(size)?;
        self.stats.rebuilds += 1;
        log::info!("Swapchain rebuilt for {}x{}", size.0, size.1);
        Ok(true)
    }

    /// Draw frames until the surface asks to close
    ///
    /// `next_input` is called once per iteration. The device is idle when
    /// this returns, whether the loop ended normally or with an error.
    pub fn run<B, S, F>(&mut self, backend: &mut B, surface: &mut S, mut next_input: F) -> VulkanResult<()>
    where
        B: FrameBackend,
        S: SurfaceProvider,
        F: FnMut() -> FrameInput,
    {
        let result = loop {
            if surface.should_close() {
                break Ok(());
            }
            surface.poll_events();
            let input = next_input();
            if let Err(e) = self.draw_frame(backend, surface, &input) {
                break Err(e);
            }
        };

        let idle = backend.wait_idle();
        if idle.is_ok() {
            self.mark_all_idle();
        }
        result.and(idle)
    }

    fn mark_all_idle(&mut self) {
        self.slots.fill(SlotState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Wait(usize),
        Acquire(usize),
        Record(usize, u32),
        Uniforms(usize),
        Submit(usize),
        Present(usize, u32),
        Rebuild((u32, u32)),
        WaitIdle,
    }

    struct MockBackend {
        slots: usize,
        images: u32,
        next_image: u32,
        calls: Vec<Call>,
        acquire_script: VecDeque<VulkanResult<AcquireOutcome>>,
        present_script: VecDeque<PresentOutcome>,
        fence_pending: Vec<bool>,
        submit_error: Option<vk::Result>,
    }

    impl MockBackend {
        fn new(slots: usize) -> Self {
            Self {
                slots,
                images: 3,
                next_image: 0,
                calls: Vec::new(),
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                fence_pending: vec![false; slots],
                submit_error: None,
            }
        }

        fn count(&self, matcher: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| matcher(c)).count()
        }
    }

    impl FrameBackend for MockBackend {
        fn frames_in_flight(&self) -> usize {
            self.slots
        }

        fn wait_for_slot(&mut self, slot: usize) -> VulkanResult<()> {
            self.calls.push(Call::Wait(slot));
            self.fence_pending[slot] = false;
            Ok(())
        }

        fn acquire_image(&mut self, slot: usize) -> VulkanResult<AcquireOutcome> {
            self.calls.push(Call::Acquire(slot));
            if let Some(scripted) = self.acquire_script.pop_front() {
                return scripted;
            }
            let image_index = self.next_image;
            self.next_image = (self.next_image + 1) % self.images;
            Ok(AcquireOutcome::Ready { image_index, suboptimal: false })
        }

        fn record_commands(&mut self, slot: usize, image_index: u32) -> VulkanResult<()> {
            assert!(!self.fence_pending[slot], "slot {slot} reused before its fence was waited on");
            self.calls.push(Call::Record(slot, image_index));
            Ok(())
        }

        fn update_uniforms(&mut self, slot: usize, _input: &FrameInput) -> VulkanResult<()> {
            self.calls.push(Call::Uniforms(slot));
            Ok(())
        }

        fn submit(&mut self, slot: usize) -> VulkanResult<()> {
            if let Some(result) = self.submit_error {
                return Err(VulkanError::runtime("queue submit")(result));
            }
            self.calls.push(Call::Submit(slot));
            self.fence_pending[slot] = true;
            Ok(())
        }

        fn present(&mut self, slot: usize, image_index: u32) -> VulkanResult<PresentOutcome> {
            self.calls.push(Call::Present(slot, image_index));
            Ok(self.present_script.pop_front().unwrap_or(PresentOutcome::Presented))
        }

        fn rebuild_swapchain(&mut self, framebuffer_size: (u32, u32)) -> VulkanResult<()> {
            assert_eq!(self.calls.last(), Some(&Call::WaitIdle), "rebuild without idle device");
            self.calls.push(Call::Rebuild(framebuffer_size));
            Ok(())
        }

        fn wait_idle(&mut self) -> VulkanResult<()> {
            self.calls.push(Call::WaitIdle);
            self.fence_pending.iter_mut().for_each(|pending| *pending = false);
            Ok(())
        }
    }

    struct MockSurface {
        sizes: VecDeque<(u32, u32)>,
        size: (u32, u32),
        resize_requested: bool,
        polls: usize,
        close_after_polls: Option<usize>,
    }

    impl MockSurface {
        fn new(size: (u32, u32)) -> Self {
            Self {
                sizes: VecDeque::new(),
                size,
                resize_requested: false,
                polls: 0,
                close_after_polls: None,
            }
        }
    }

    impl SurfaceProvider for MockSurface {
        fn framebuffer_size(&self) -> (u32, u32) {
            self.size
        }

        fn take_resize_request(&mut self) -> bool {
            std::mem::take(&mut self.resize_requested)
        }

        fn poll_events(&mut self) {
            self.polls += 1;
            if let Some(next) = self.sizes.pop_front() {
                self.size = next;
            }
        }

        fn should_close(&self) -> bool {
            self.close_after_polls.is_some_and(|limit| self.polls >= limit)
        }
    }

    #[test]
    fn test_steady_state_frame_order() {
        let mut backend = MockBackend::new(2);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let outcome = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(
            backend.calls,
            vec![
                Call::Wait(0),
                Call::Acquire(0),
                Call::Record(0, 0),
                Call::Uniforms(0),
                Call::Submit(0),
                Call::Present(0, 0),
            ]
        );
        assert_eq!(scheduler.frame_count(), 1);
        assert_eq!(scheduler.current_slot(), 1);
        assert_eq!(scheduler.slot_states(), &[SlotState::Presenting, SlotState::Idle]);
    }

    #[test]
    fn test_slots_round_robin() {
        let mut backend = MockBackend::new(2);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        for _ in 0..5 {
            scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        }

        let waits: Vec<usize> = backend
            .calls
            .iter()
            .filter_map(|c| if let Call::Wait(slot) = c { Some(*slot) } else { None })
            .collect();
        assert_eq!(waits, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_out_of_date_acquire_rebuilds_without_advancing() {
        let mut backend = MockBackend::new(2);
        backend.acquire_script.push_back(Ok(AcquireOutcome::OutOfDate));
        let mut surface = MockSurface::new((800, 600));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let outcome = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(scheduler.frame_count(), 0);
        assert_eq!(scheduler.current_slot(), 0);
        assert_eq!(backend.count(|c| matches!(c, Call::Submit(_))), 0);
        assert_eq!(backend.count(|c| matches!(c, Call::Rebuild((800, 600)))), 1);
        assert_eq!(scheduler.stats().frames_skipped, 1);
        assert_eq!(scheduler.stats().rebuilds, 1);
    }

    #[test]
    fn test_surface_invalidated_error_is_handled_locally() {
        let mut backend = MockBackend::new(2);
        backend.acquire_script.push_back(Err(VulkanError::SurfaceInvalidated));
        let mut surface = MockSurface::new((800, 600));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let outcome = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default());

        assert_eq!(outcome.unwrap(), FrameOutcome::Skipped);
    }

    #[test]
    fn test_suboptimal_acquire_still_renders() {
        let mut backend = MockBackend::new(2);
        backend
            .acquire_script
            .push_back(Ok(AcquireOutcome::Ready { image_index: 2, suboptimal: true }));
        let mut surface = MockSurface::new((800, 600));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let outcome = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(outcome, FrameOutcome::Presented);
        assert!(backend.calls.contains(&Call::Present(0, 2)));
        assert_eq!(backend.count(|c| matches!(c, Call::Rebuild(_))), 0);
    }

    #[test]
    fn test_suboptimal_present_rebuilds_after_presenting() {
        let mut backend = MockBackend::new(2);
        backend.present_script.push_back(PresentOutcome::Suboptimal);
        let mut surface = MockSurface::new((1024, 768));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let outcome = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(outcome, FrameOutcome::PresentedAndRebuilt);
        let present_at = backend.calls.iter().position(|c| matches!(c, Call::Present(..))).unwrap();
        let rebuild_at = backend.calls.iter().position(|c| matches!(c, Call::Rebuild(_))).unwrap();
        assert!(present_at < rebuild_at);
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn test_resize_flag_triggers_rebuild_once() {
        let mut backend = MockBackend::new(2);
        let mut surface = MockSurface::new((640, 480));
        surface.resize_requested = true;
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let first = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        let second = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(first, FrameOutcome::PresentedAndRebuilt);
        assert_eq!(second, FrameOutcome::Presented);
        assert_eq!(scheduler.stats().rebuilds, 1);
    }

    #[test]
    fn test_out_of_date_acquire_with_pending_resize_rebuilds_once() {
        let mut backend = MockBackend::new(2);
        backend.acquire_script.push_back(Ok(AcquireOutcome::OutOfDate));
        let mut surface = MockSurface::new((1024, 768));
        surface.resize_requested = true;
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let first = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        let second = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(first, FrameOutcome::Skipped);
        assert_eq!(second, FrameOutcome::Presented);
        assert!(!surface.resize_requested);
        assert_eq!(scheduler.stats().rebuilds, 1);
        assert_eq!(backend.count(|c| matches!(c, Call::Rebuild(_))), 1);
    }

    #[test]
    fn test_slot_stays_in_flight_until_its_fence_is_waited() {
        let mut backend = MockBackend::new(2);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        assert_eq!(scheduler.slot_states(), &[SlotState::Presenting, SlotState::Presenting]);

        // a rebuild idles the device, so every slot is free again
        surface.resize_requested = true;
        let outcome = scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        assert_eq!(outcome, FrameOutcome::PresentedAndRebuilt);
        assert_eq!(scheduler.slot_states(), &[SlotState::Idle, SlotState::Idle]);
    }

    #[test]
    fn test_failed_submit_leaves_slot_recording() {
        let mut backend = MockBackend::new(2);
        backend.submit_error = Some(vk::Result::ERROR_DEVICE_LOST);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        assert!(scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).is_err());
        assert_eq!(scheduler.slot_states()[0], SlotState::Recording);
    }

    #[test]
    fn test_minimized_surface_suspends_rebuild() {
        let mut backend = MockBackend::new(2);
        backend.present_script.push_back(PresentOutcome::OutOfDate);
        let mut surface = MockSurface::new((0, 0));
        surface.sizes.extend([(0, 0), (0, 0), (1280, 720)]);
        let mut scheduler = FrameScheduler::for_backend(&backend);

        scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();

        assert_eq!(surface.polls, 3);
        assert_eq!(
            backend.calls.iter().filter(|c| matches!(c, Call::Rebuild(_))).collect::<Vec<_>>(),
            vec![&Call::Rebuild((1280, 720))]
        );
    }

    #[test]
    fn test_close_while_minimized_skips_rebuild() {
        let mut backend = MockBackend::new(2);
        let mut surface = MockSurface::new((0, 0));
        surface.close_after_polls = Some(2);
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let rebuilt = scheduler.rebuild(&mut backend, &mut surface).unwrap();

        assert!(!rebuilt);
        assert_eq!(backend.count(|c| matches!(c, Call::Rebuild(_))), 0);
        assert_eq!(backend.count(|c| matches!(c, Call::WaitIdle)), 0);
    }

    #[test]
    fn test_fence_wait_precedes_every_reuse() {
        let mut backend = MockBackend::new(2);
        backend.acquire_script.extend([
            Ok(AcquireOutcome::Ready { image_index: 0, suboptimal: false }),
            Ok(AcquireOutcome::OutOfDate),
            Ok(AcquireOutcome::Ready { image_index: 1, suboptimal: true }),
        ]);
        backend.present_script.extend([PresentOutcome::Presented, PresentOutcome::Suboptimal]);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        // MockBackend::record_commands panics on a slot whose fence was not waited on.
        for _ in 0..12 {
            scheduler.draw_frame(&mut backend, &mut surface, &FrameInput::default()).unwrap();
        }

        let mut waited = vec![false; 2];
        for call in &backend.calls {
            match call {
                Call::Wait(slot) => waited[*slot] = true,
                Call::Submit(slot) => {
                    assert!(waited[*slot]);
                    waited[*slot] = false;
                }
                _ => {}
            }
        }
        assert_eq!(scheduler.frame_count(), 11);
    }

    #[test]
    fn test_runtime_error_propagates() {
        let mut backend = MockBackend::new(2);
        backend.submit_error = Some(vk::Result::ERROR_DEVICE_LOST);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let err = scheduler
            .draw_frame(&mut backend, &mut surface, &FrameInput::default())
            .unwrap_err();

        assert!(matches!(err, VulkanError::Runtime { result: vk::Result::ERROR_DEVICE_LOST, .. }));
        assert_eq!(scheduler.frame_count(), 0);
    }

    #[test]
    fn test_run_ends_with_idle_device() {
        let mut backend = MockBackend::new(2);
        let mut surface = MockSurface::new((640, 480));
        surface.close_after_polls = Some(3);
        let mut scheduler = FrameScheduler::for_backend(&backend);
        let mut inputs = 0;

        scheduler
            .run(&mut backend, &mut surface, || {
                inputs += 1;
                FrameInput::default()
            })
            .unwrap();

        assert_eq!(inputs, 3);
        assert_eq!(scheduler.frame_count(), 3);
        assert_eq!(backend.calls.last(), Some(&Call::WaitIdle));
    }

    #[test]
    fn test_run_waits_idle_after_error() {
        let mut backend = MockBackend::new(2);
        backend.submit_error = Some(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        let mut surface = MockSurface::new((640, 480));
        let mut scheduler = FrameScheduler::for_backend(&backend);

        let result = scheduler.run(&mut backend, &mut surface, FrameInput::default);

        assert!(result.is_err());
        assert_eq!(backend.calls.last(), Some(&Call::WaitIdle));
    }
}
