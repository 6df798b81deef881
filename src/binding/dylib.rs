//! 动态库绑定
//!
//! 用 `libloading` 打开模块，并在加载时一次性解析全部入口点为带类型的函数指针。
//! 任何一个入口点缺失都视为加载失败，不会留下半绑定的模块。

use std::ffi::{c_char, c_int, c_void, CStr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;

use super::native::{ModuleLoader, NativeApi, ENTRY_POINTS};
use crate::abi::init_options::to_native_bool;
use crate::abi::{
    read_record, write_record, ApiInitOptions, CVersionInfo, LayoutError, LayoutResult,
    NativeBool, WideChar, LANGUAGE_CAPACITY, PATH_CAPACITY,
};

type GetVersionFn = unsafe extern "C" fn(*mut CVersionInfo);
type QueryVersionFn = unsafe extern "C" fn(*mut CVersionInfo) -> NativeBool;
type WideQueryFn = unsafe extern "C" fn(*mut WideChar) -> NativeBool;
type SetTimeoutFn = unsafe extern "C" fn(c_int);
type InitFn = unsafe extern "C" fn(*mut ApiInitOptions) -> NativeBool;
type DoneFn = unsafe extern "C" fn();
type ReadyFn = unsafe extern "C" fn() -> NativeBool;
type PostCommandFn = unsafe extern "C" fn(*const c_char, NativeBool) -> NativeBool;
type CloseFn = unsafe extern "C" fn(NativeBool) -> NativeBool;
type MetersToScaleFn = unsafe extern "C" fn(c_int) -> f64;

/// 已解析的入口点表
#[derive(Clone, Copy)]
struct EntryPoints {
    get_api_version: GetVersionFn,
    get_version: QueryVersionFn,
    get_path: WideQueryFn,
    set_receive_timeout: SetTimeoutFn,
    init: InitFn,
    done: DoneFn,
    is_ready: ReadyFn,
    get_language: WideQueryFn,
    post_command: PostCommandFn,
    close: CloseFn,
    meters_to_scale: MetersToScaleFn,
}

unsafe fn typed<T: Copy>(library: &Library, symbol: &str) -> Result<T, String> {
    library
        .get::<T>(symbol.as_bytes())
        .map(|s| *s)
        .map_err(|e| format!("Entry point '{}' not found: {}", symbol, e))
}

impl EntryPoints {
    /// 解析全部入口点
    ///
    /// # Safety
    ///
    /// 调用方必须保证模块导出的符号与 [`ENTRY_POINTS`] 中的签名一致，
    /// 且返回的函数指针不会在 `library` 卸载后被调用。
    unsafe fn resolve(library: &Library) -> Result<Self, String> {
        let missing: Vec<&str> = ENTRY_POINTS
            .iter()
            .filter(|ep| library.get::<*const c_void>(ep.symbol.as_bytes()).is_err())
            .map(|ep| ep.symbol)
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing entry points: {}", missing.join(", ")));
        }

        Ok(Self {
            get_api_version: typed(library, "GetAmApiVersion")?,
            get_version: typed(library, "GetAmVersion")?,
            get_path: typed(library, "GetAmPath")?,
            set_receive_timeout: typed(library, "SetAmApiRecieveTimeout")?,
            init: typed(library, "AmApiInit")?,
            done: typed(library, "AmApiDone")?,
            is_ready: typed(library, "IsAmAndApiReady")?,
            get_language: typed(library, "GetAmCurrentLanguage")?,
            post_command: typed(library, "PostCommandToAm")?,
            close: typed(library, "CloseAm")?,
            meters_to_scale: typed(library, "AmMetersToScale")?,
        })
    }
}

fn check_wide(record: &'static str, buffer: &[WideChar], capacity: usize) -> LayoutResult<()> {
    if buffer.len() != capacity {
        let unit = std::mem::size_of::<WideChar>();
        return Err(LayoutError::SizeMismatch {
            record,
            expected: capacity * unit,
            actual: buffer.len() * unit,
        });
    }
    Ok(())
}

/// 由动态库支撑的模块
pub struct DylibModule {
    entry_points: EntryPoints,
    path: PathBuf,
    // 必须比 entry_points 活得久
    _library: Library,
}

impl DylibModule {
    /// 打开模块
    ///
    /// 失败原因包括：文件不存在、架构不匹配（例如 32 位 DLL 与 64 位进程）、缺少入口点。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();

        // SAFETY: 加载外部模块会运行其初始化代码，这是选择该模块时已接受的前提
        let library = unsafe { Library::new(path) }.map_err(|e| e.to_string())?;
        // SAFETY: 签名与模块文档一致；函数指针与 library 存放在同一结构中一起释放
        let entry_points = unsafe { EntryPoints::resolve(&library) }?;

        tracing::debug!(target: "binding", path = %path.display(), "Resolved {} entry points", ENTRY_POINTS.len());

        Ok(Self {
            entry_points,
            path: path.to_path_buf(),
            _library: library,
        })
    }
}

impl Drop for DylibModule {
    fn drop(&mut self) {
        tracing::debug!(target: "binding", path = %self.path.display(), "Releasing native module");
    }
}

impl NativeApi for DylibModule {
    fn api_version(&self, record: &mut [u8]) -> LayoutResult<()> {
        let mut raw: CVersionInfo = read_record("CVersionInfo", record)?;
        // SAFETY: raw 是对齐且有效的 CVersionInfo，调用期间一直存活
        unsafe { (self.entry_points.get_api_version)(&mut raw) };
        write_record("CVersionInfo", &raw, record)
    }

    fn installed_version(&self, record: &mut [u8]) -> LayoutResult<bool> {
        let mut raw: CVersionInfo = read_record("CVersionInfo", record)?;
        // SAFETY: 同上
        let ok = unsafe { (self.entry_points.get_version)(&mut raw) } != 0;
        write_record("CVersionInfo", &raw, record)?;
        Ok(ok)
    }

    fn install_path(&self, buffer: &mut [WideChar]) -> LayoutResult<bool> {
        check_wide("wchar_t[512]", buffer, PATH_CAPACITY)?;
        // SAFETY: 缓冲区容量已校验为原生侧假定的 512 个单元
        Ok(unsafe { (self.entry_points.get_path)(buffer.as_mut_ptr()) } != 0)
    }

    fn set_receive_timeout(&self, timeout_ms: i32) {
        // SAFETY: 纯值参数
        unsafe { (self.entry_points.set_receive_timeout)(timeout_ms) }
    }

    fn init(&self, options: &[u8], process_created: &mut bool) -> LayoutResult<bool> {
        let mut raw: ApiInitOptions = read_record("ApiInitOptions", options)?;
        let mut slot: NativeBool = 0;
        raw.attach_process_created(&mut slot);
        // SAFETY: raw 与 slot 都在本栈帧内，调用返回前一直有效
        let ok = unsafe { (self.entry_points.init)(&mut raw) } != 0;
        raw.detach_process_created();
        *process_created = slot != 0;
        Ok(ok)
    }

    fn done(&self) {
        // SAFETY: 无参数
        unsafe { (self.entry_points.done)() }
    }

    fn is_ready(&self) -> bool {
        // SAFETY: 无参数
        unsafe { (self.entry_points.is_ready)() != 0 }
    }

    fn current_language(&self, buffer: &mut [WideChar]) -> LayoutResult<bool> {
        check_wide("wchar_t[16]", buffer, LANGUAGE_CAPACITY)?;
        // SAFETY: 缓冲区容量已校验为 16 个单元
        Ok(unsafe { (self.entry_points.get_language)(buffer.as_mut_ptr()) } != 0)
    }

    fn post_command(&self, command: &CStr, beep: bool) -> bool {
        // SAFETY: command 以空字节结尾，调用期间有效；原生侧只读
        unsafe { (self.entry_points.post_command)(command.as_ptr(), to_native_bool(beep)) != 0 }
    }

    fn close(&self, kill_if_not_responding: bool) -> bool {
        // SAFETY: 纯值参数
        unsafe { (self.entry_points.close)(to_native_bool(kill_if_not_responding)) != 0 }
    }

    fn meters_to_scale(&self, meters: i32) -> f64 {
        // SAFETY: 纯值参数，范围检查由原生侧负责
        unsafe { (self.entry_points.meters_to_scale)(meters) }
    }
}

/// 基于 `libloading` 的加载器
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl ModuleLoader for DylibLoader {
    fn open(&self, path: &Path) -> Result<Arc<dyn NativeApi>, String> {
        let module = DylibModule::open(path)?;
        Ok(Arc::new(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_missing_module() {
        let err = DylibModule::open("/nonexistent/dir/tpcAmApi.dll").err().unwrap();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_open_non_library_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a shared object").unwrap();
        assert!(DylibLoader.open(file.path()).is_err());
    }

    #[test]
    fn test_open_reports_missing_entry_points() {
        let Some(path) = option_env!("AMAPI_FIXTURE_PARTIAL") else {
            eprintln!("Native fixture not built, skipping test");
            return;
        };
        let err = DylibModule::open(path).err().unwrap();
        assert_eq!(err, "missing entry points: AmMetersToScale");
    }

    #[test]
    fn test_open_resolves_full_table() {
        let Some(path) = option_env!("AMAPI_FIXTURE_FULL") else {
            eprintln!("Native fixture not built, skipping test");
            return;
        };
        let module = DylibModule::open(path).unwrap();

        let mut record = vec![0u8; std::mem::size_of::<CVersionInfo>()];
        module.api_version(&mut record).unwrap();
        assert_eq!(&record[..9], &[1, 0, 2, 0, 3, 0, 4, 0, 5]);

        let mut path_buf = vec![0 as WideChar; PATH_CAPACITY];
        assert!(module.install_path(&mut path_buf).unwrap());
        let expected: Vec<WideChar> = "C:\\AutoMapa".chars().map(|c| c as WideChar).collect();
        assert_eq!(&path_buf[..expected.len()], expected.as_slice());
        assert_eq!(path_buf[expected.len()], 0);

        // 缓冲区容量不符时不发起调用
        let mut short = vec![0 as WideChar; LANGUAGE_CAPACITY];
        assert!(module.install_path(&mut short).is_err());
        assert_eq!(module.meters_to_scale(2000), 20.0);
    }

    #[test]
    fn test_check_wide_capacity() {
        let buf = vec![0 as WideChar; LANGUAGE_CAPACITY];
        assert!(check_wide("wchar_t[16]", &buf, LANGUAGE_CAPACITY).is_ok());
        assert!(matches!(
            check_wide("wchar_t[512]", &buf, PATH_CAPACITY),
            Err(LayoutError::SizeMismatch { record: "wchar_t[512]", .. })
        ));
    }
}
