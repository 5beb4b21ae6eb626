//! Windows shell property provider.
//!
//! Reads the same columns Explorer's details view shows, through
//! `IShellFolder2::GetDetailsOf`. Column names come from the folder holding
//! the reference file; values come from the folder holding each queried file.
//! Columns a folder does not support read as empty strings.

use super::{MetadataProvider, ProviderFailure};
use std::cell::RefCell;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use windows::core::{Interface, HSTRING, PWSTR};
use windows::Win32::System::Com::{
    CoInitializeEx, CoTaskMemFree, CoUninitialize, IBindCtx, COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::Common::{ITEMIDLIST, SHELLDETAILS};
use windows::Win32::UI::Shell::{IShellFolder2, SHBindToParent, SHParseDisplayName, StrRetToStrW};

pub struct ShellProvider {
    reference: PathBuf,
    // Value queries arrive slot by slot for the same file; keep its binding.
    bound: RefCell<Option<BoundItem>>,
    _apartment: ComApartment,
}

impl ShellProvider {
    /// Enter a COM apartment on the current thread and check that
    /// `reference_file` can be bound.
    pub fn new(reference_file: &Path) -> Result<Self, ProviderFailure> {
        let apartment = ComApartment::enter()?;
        BoundItem::bind(reference_file)?;
        Ok(Self {
            reference: reference_file.to_path_buf(),
            bound: RefCell::new(None),
            _apartment: apartment,
        })
    }

    fn with_item<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&BoundItem) -> T,
    ) -> Result<T, ProviderFailure> {
        let mut bound = self.bound.borrow_mut();
        let stale = bound.as_ref().map_or(true, |item| item.path != path);
        if stale {
            *bound = None;
            *bound = Some(BoundItem::bind(path)?);
        }
        match bound.as_ref() {
            Some(item) => Ok(f(item)),
            None => Err(ProviderFailure::new("shell item binding lost")),
        }
    }
}

impl MetadataProvider for ShellProvider {
    fn display_name(&self, slot: u32) -> Result<String, ProviderFailure> {
        self.with_item(&self.reference, |item| details_of(&item.folder, None, slot))
    }

    fn value(&self, path: &Path, slot: u32) -> Result<String, ProviderFailure> {
        self.with_item(path, |item| details_of(&item.folder, Some(item.child), slot))
    }
}

struct ComApartment;

impl ComApartment {
    fn enter() -> Result<Self, ProviderFailure> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| ProviderFailure::new(format!("CoInitializeEx failed: {}", e)))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Absolute ID list allocated by the shell, freed on drop.
struct ItemIdList(*mut ITEMIDLIST);

impl Drop for ItemIdList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CoTaskMemFree(Some(self.0 as *const c_void)) };
        }
    }
}

/// A file bound to its parent shell folder.
struct BoundItem {
    path: PathBuf,
    folder: IShellFolder2,
    // Points into `_absolute`, which must outlive it.
    child: *const ITEMIDLIST,
    _absolute: ItemIdList,
}

impl BoundItem {
    fn bind(path: &Path) -> Result<Self, ProviderFailure> {
        let failure = |what: &str, e: windows::core::Error| {
            ProviderFailure::new(format!("{} failed for {}: {}", what, path.display(), e))
        };

        let name = HSTRING::from(path.as_os_str());
        let mut absolute: *mut ITEMIDLIST = std::ptr::null_mut();
        unsafe { SHParseDisplayName(&name, None::<&IBindCtx>, &mut absolute, 0, None) }
            .map_err(|e| failure("SHParseDisplayName", e))?;
        let absolute = ItemIdList(absolute);

        let mut raw_folder: *mut c_void = std::ptr::null_mut();
        let mut child: *mut ITEMIDLIST = std::ptr::null_mut();
        unsafe {
            SHBindToParent(
                absolute.0,
                &IShellFolder2::IID,
                &mut raw_folder,
                Some(&mut child as *mut *mut ITEMIDLIST),
            )
        }
        .map_err(|e| failure("SHBindToParent", e))?;
        let folder = unsafe { IShellFolder2::from_raw(raw_folder) };

        Ok(Self {
            path: path.to_path_buf(),
            folder,
            child: child as *const ITEMIDLIST,
            _absolute: absolute,
        })
    }
}

/// Column text for `child` (or the column header when `child` is `None`).
fn details_of(folder: &IShellFolder2, child: Option<*const ITEMIDLIST>, slot: u32) -> String {
    let mut details = SHELLDETAILS::default();
    if unsafe { folder.GetDetailsOf(child, slot, &mut details) }.is_err() {
        return String::new();
    }

    let mut text = PWSTR::null();
    if unsafe { StrRetToStrW(&mut details.str, child, &mut text) }.is_err() {
        return String::new();
    }
    let value = unsafe { text.to_string() }.unwrap_or_default();
    unsafe { CoTaskMemFree(Some(text.0 as *const c_void)) };
    value
}
