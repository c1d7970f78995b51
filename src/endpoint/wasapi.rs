//! Endpoint volume control through the Windows Core Audio API
//!
//! Channel 0 is left and channel 1 is right.

use std::cell::Cell;

use windows::{
    core::{Error as WinError, HRESULT, PWSTR},
    Win32::{
        Devices::FunctionDiscovery::PKEY_Device_FriendlyName,
        Media::Audio::{
            eConsole, eRender, Endpoints::IAudioEndpointVolume, IMMDevice, IMMDeviceEnumerator,
            MMDeviceEnumerator,
        },
        System::Com::{
            CoCreateInstance, CoInitializeEx, CoTaskMemFree, CLSCTX_ALL, COINIT_MULTITHREADED,
            STGM_READ,
        },
    },
};

use crate::{Balance, ChannelVolumeSink, SinkError, SinkResult};

const AUDCLNT_E_DEVICE_INVALIDATED: HRESULT = HRESULT(0x8889_0004_u32 as i32);
const AUDCLNT_E_SERVICE_NOT_RUNNING: HRESULT = HRESULT(0x8889_0010_u32 as i32);
const E_NOTFOUND: HRESULT = HRESULT(0x8007_0490_u32 as i32);
const RPC_E_CHANGED_MODE: HRESULT = HRESULT(0x8001_0106_u32 as i32);

thread_local! {
    static COM_READY: Cell<bool> = const { Cell::new(false) };
}

fn ensure_com() -> SinkResult<()> {
    if COM_READY.with(Cell::get) {
        return Ok(());
    }
    let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
    // A thread that already joined another apartment can still make these calls
    if hr.is_ok() || hr == RPC_E_CHANGED_MODE {
        COM_READY.with(|ready| ready.set(true));
        Ok(())
    } else {
        Err(map_error(WinError::from(hr)))
    }
}

fn map_error(e: WinError) -> SinkError {
    let code = e.code();
    if code == AUDCLNT_E_DEVICE_INVALIDATED
        || code == AUDCLNT_E_SERVICE_NOT_RUNNING
        || code == E_NOTFOUND
    {
        SinkError::EndpointUnavailable
    } else {
        SinkError::InvalidEndpointState(format!("{} ({:#010x})", e.message(), code.0))
    }
}

fn default_device() -> SinkResult<IMMDevice> {
    ensure_com()?;
    unsafe {
        let enumerator: IMMDeviceEnumerator =
            CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(map_error)?;
        enumerator
            .GetDefaultAudioEndpoint(eRender, eConsole)
            .map_err(map_error)
    }
}

fn device_id(device: &IMMDevice) -> SinkResult<String> {
    unsafe {
        let id: PWSTR = device.GetId().map_err(map_error)?;
        let res = id.to_string();
        CoTaskMemFree(Some(id.0 as *const _));
        res.map_err(|e| SinkError::InvalidEndpointState(e.to_string()))
    }
}

/**
A [`ChannelVolumeSink`] for the default Windows render endpoint

The default endpoint is resolved again before every call, so the sink follows
the user switching outputs. No COM pointers are kept between calls.
*/
#[derive(Debug, Default)]
pub struct EndpointVolumeSink {
    bound: Option<String>,
}

impl EndpointVolumeSink {
    /// Create a new sink for the default render endpoint
    pub fn new() -> Self {
        Self::default()
    }
    /// Get the ID of the endpoint the last call resolved to
    pub fn bound_id(&self) -> Option<&str> {
        self.bound.as_deref()
    }
    fn resolve(&mut self) -> SinkResult<(IMMDevice, IAudioEndpointVolume)> {
        let device = default_device()?;
        let id = device_id(&device)?;
        if self.bound.as_deref() != Some(id.as_str()) {
            match &self.bound {
                Some(_) => log::info!("Default output endpoint changed, rebinding to {id}"),
                None => log::debug!("Bound to output endpoint {id}"),
            }
            self.bound = Some(id);
        }
        let volume = unsafe { device.Activate::<IAudioEndpointVolume>(CLSCTX_ALL, None) }
            .map_err(map_error)?;
        Ok((device, volume))
    }
}

impl ChannelVolumeSink for EndpointVolumeSink {
    fn set_channel_volume(&mut self, left: f32, right: f32) -> SinkResult<()> {
        let (_, volume) = self.resolve()?;
        unsafe {
            let channels = volume.GetChannelCount().map_err(map_error)?;
            match channels {
                0 => return Err(SinkError::InvalidEndpointState("endpoint has no channels".into())),
                1 => volume
                    .SetChannelVolumeLevelScalar(0, (left + right) / 2.0, std::ptr::null())
                    .map_err(map_error)?,
                _ => {
                    volume
                        .SetChannelVolumeLevelScalar(0, left, std::ptr::null())
                        .map_err(map_error)?;
                    volume
                        .SetChannelVolumeLevelScalar(1, right, std::ptr::null())
                        .map_err(map_error)?;
                }
            }
        }
        Ok(())
    }
    fn channel_volume(&mut self) -> SinkResult<Balance> {
        let (_, volume) = self.resolve()?;
        unsafe {
            let channels = volume.GetChannelCount().map_err(map_error)?;
            let left = volume.GetChannelVolumeLevelScalar(0).map_err(map_error)?;
            let right = if channels > 1 {
                volume.GetChannelVolumeLevelScalar(1).map_err(map_error)?
            } else {
                left
            };
            Ok(Balance::new(left, right))
        }
    }
    fn endpoint_name(&mut self) -> SinkResult<String> {
        let device = default_device()?;
        let id = device_id(&device)?;
        let name = unsafe {
            device
                .OpenPropertyStore(STGM_READ)
                .and_then(|store| store.GetValue(&PKEY_Device_FriendlyName))
                .map(|value| value.to_string())
        };
        match name {
            Ok(name) if !name.is_empty() => Ok(name),
            Ok(_) => Ok(id),
            Err(e) => {
                log::debug!("No friendly name for {id}: {e}");
                Ok(id)
            }
        }
    }
}
