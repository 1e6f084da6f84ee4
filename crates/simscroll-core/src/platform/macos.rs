//! CoreGraphics window server and event injection

use std::ffi::{c_char, c_void, CStr};
use std::ptr;

use objc2_core_foundation::{CGPoint, CGRect, CGSize};
use tracing::trace;

use crate::emitter::InputSink;
use crate::geometry::{Point, Rect};
use crate::windows::{WindowInfo, WindowSource};
use crate::{Error, Result};

type CFTypeRef = *const c_void;
type CFIndex = isize;
type CGDirectDisplayID = u32;

const WINDOW_LIST_ON_SCREEN_ONLY: u32 = 1 << 0;
const WINDOW_LIST_EXCLUDE_DESKTOP_ELEMENTS: u32 = 1 << 4;
const NULL_WINDOW_ID: u32 = 0;

const EVENT_LEFT_MOUSE_DOWN: u32 = 1;
const EVENT_LEFT_MOUSE_UP: u32 = 2;
const EVENT_LEFT_MOUSE_DRAGGED: u32 = 6;
const MOUSE_BUTTON_LEFT: u32 = 0;
const HID_EVENT_TAP: u32 = 0;

const NUMBER_SINT64_TYPE: CFIndex = 4;
const STRING_ENCODING_UTF8: u32 = 0x0800_0100;

const MAX_DISPLAYS: usize = 16;
const OWNER_NAME_CAPACITY: usize = 512;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    static kCGWindowOwnerName: CFTypeRef;
    static kCGWindowBounds: CFTypeRef;
    static kCGWindowLayer: CFTypeRef;

    fn CGWindowListCopyWindowInfo(option: u32, relative_to_window: u32) -> CFTypeRef;
    fn CGRectMakeWithDictionaryRepresentation(dict: CFTypeRef, rect: *mut CGRect) -> u8;
    fn CGGetActiveDisplayList(
        max_displays: u32,
        active_displays: *mut CGDirectDisplayID,
        display_count: *mut u32,
    ) -> i32;
    fn CGDisplayBounds(display: CGDirectDisplayID) -> CGRect;
    fn CGMainDisplayID() -> CGDirectDisplayID;
    fn CGEventCreateMouseEvent(
        source: CFTypeRef,
        mouse_type: u32,
        position: CGPoint,
        button: u32,
    ) -> CFTypeRef;
    fn CGEventPost(tap: u32, event: CFTypeRef);
    fn CGWarpMouseCursorPosition(point: CGPoint) -> i32;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFArrayGetCount(array: CFTypeRef) -> CFIndex;
    fn CFArrayGetValueAtIndex(array: CFTypeRef, index: CFIndex) -> CFTypeRef;
    fn CFDictionaryGetValue(dict: CFTypeRef, key: CFTypeRef) -> CFTypeRef;
    fn CFNumberGetValue(number: CFTypeRef, number_type: CFIndex, value: *mut c_void) -> u8;
    fn CFStringGetCString(
        string: CFTypeRef,
        buffer: *mut c_char,
        buffer_size: CFIndex,
        encoding: u32,
    ) -> u8;
    fn CFRelease(cf: CFTypeRef);
}

/// Owned CoreFoundation reference, released on drop
struct Owned(CFTypeRef);

impl Owned {
    fn new(cf: CFTypeRef) -> Option<Self> {
        (!cf.is_null()).then_some(Self(cf))
    }
}

impl Drop for Owned {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) }
    }
}

/// Window and display lists from the window server
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreGraphicsWindows;

impl CoreGraphicsWindows {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSource for CoreGraphicsWindows {
    fn windows(&self) -> Result<Vec<WindowInfo>> {
        let options = WINDOW_LIST_ON_SCREEN_ONLY | WINDOW_LIST_EXCLUDE_DESKTOP_ELEMENTS;
        let list = Owned::new(unsafe { CGWindowListCopyWindowInfo(options, NULL_WINDOW_ID) })
            .ok_or_else(|| Error::WindowEnumeration("window list unavailable".into()))?;

        let count = unsafe { CFArrayGetCount(list.0) };
        let mut windows = Vec::with_capacity(count.max(0) as usize);
        for index in 0..count {
            // Borrowed from the array, not released
            let entry = unsafe { CFArrayGetValueAtIndex(list.0, index) };
            if let Some(window) = unsafe { window_info(entry) } {
                windows.push(window);
            }
        }

        trace!(count = windows.len(), "Enumerated windows");
        Ok(windows)
    }

    fn screens(&self) -> Result<Vec<Rect>> {
        let mut ids = [0 as CGDirectDisplayID; MAX_DISPLAYS];
        let mut count = 0u32;
        let err = unsafe { CGGetActiveDisplayList(MAX_DISPLAYS as u32, ids.as_mut_ptr(), &mut count) };
        if err != 0 {
            return Err(Error::Platform(format!(
                "display enumeration failed with CGError {}",
                err
            )));
        }

        // Display bounds are top-left-origin relative to the main display;
        // screens are reported bottom-left-origin like AppKit
        let main_height = unsafe { CGDisplayBounds(CGMainDisplayID()) }.size.height;
        Ok(ids[..count as usize]
            .iter()
            .map(|id| {
                let bounds = unsafe { CGDisplayBounds(*id) };
                Rect::new(
                    bounds.origin.x,
                    main_height - (bounds.origin.y + bounds.size.height),
                    bounds.size.width,
                    bounds.size.height,
                )
            })
            .collect())
    }
}

/// Parse one window-list dictionary; entries without bounds are skipped
unsafe fn window_info(entry: CFTypeRef) -> Option<WindowInfo> {
    if entry.is_null() {
        return None;
    }

    let bounds = CFDictionaryGetValue(entry, kCGWindowBounds);
    if bounds.is_null() {
        return None;
    }
    let mut frame = CGRect::new(CGPoint::new(0.0, 0.0), CGSize::new(0.0, 0.0));
    if CGRectMakeWithDictionaryRepresentation(bounds, &mut frame) == 0 {
        return None;
    }

    let owner = cf_string(CFDictionaryGetValue(entry, kCGWindowOwnerName)).unwrap_or_default();
    let layer = cf_i64(CFDictionaryGetValue(entry, kCGWindowLayer)).unwrap_or(0);

    Some(WindowInfo {
        owner,
        frame: Rect::new(frame.origin.x, frame.origin.y, frame.size.width, frame.size.height),
        layer,
    })
}

unsafe fn cf_string(string: CFTypeRef) -> Option<String> {
    if string.is_null() {
        return None;
    }
    let mut buffer = [0 as c_char; OWNER_NAME_CAPACITY];
    if CFStringGetCString(string, buffer.as_mut_ptr(), buffer.len() as CFIndex, STRING_ENCODING_UTF8) == 0 {
        return None;
    }
    Some(CStr::from_ptr(buffer.as_ptr()).to_string_lossy().into_owned())
}

unsafe fn cf_i64(number: CFTypeRef) -> Option<i64> {
    if number.is_null() {
        return None;
    }
    let mut value = 0i64;
    if CFNumberGetValue(number, NUMBER_SINT64_TYPE, &mut value as *mut i64 as *mut c_void) == 0 {
        return None;
    }
    Some(value)
}

/// Posts left-button mouse events at the HID event tap
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreGraphicsSink;

impl CoreGraphicsSink {
    pub fn new() -> Self {
        Self
    }

    fn post(&self, event_type: u32, name: &'static str, point: Point) -> Result<()> {
        let position = CGPoint::new(point.x, point.y);
        let event = Owned::new(unsafe {
            CGEventCreateMouseEvent(ptr::null(), event_type, position, MOUSE_BUTTON_LEFT)
        })
        .ok_or(Error::EventInjection(name))?;

        unsafe { CGEventPost(HID_EVENT_TAP, event.0) };
        Ok(())
    }
}

impl InputSink for CoreGraphicsSink {
    fn post_mouse_down(&mut self, point: Point) -> Result<()> {
        self.post(EVENT_LEFT_MOUSE_DOWN, "mouse-down", point)
    }

    fn post_mouse_drag(&mut self, point: Point) -> Result<()> {
        self.post(EVENT_LEFT_MOUSE_DRAGGED, "mouse-drag", point)
    }

    fn post_mouse_up(&mut self, point: Point) -> Result<()> {
        self.post(EVENT_LEFT_MOUSE_UP, "mouse-up", point)
    }

    fn warp_cursor(&mut self, point: Point) -> Result<()> {
        let err = unsafe { CGWarpMouseCursorPosition(CGPoint::new(point.x, point.y)) };
        if err != 0 {
            return Err(Error::Platform(format!("cursor warp failed with CGError {}", err)));
        }
        Ok(())
    }
}
