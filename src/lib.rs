pub mod app;

use app::commands::{
    check_adb, check_fastboot, export_diagnostics_bundle, flash_partition, get_config,
    get_device_info, get_fastboot_product, install_package, list_devices, list_fastboot_devices,
    reboot_device, reset_config, save_app_config, select_image_file, uninstall_package, wipe_data,
};
use app::logging::init_logging;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            get_config,
            save_app_config,
            reset_config,
            check_adb,
            check_fastboot,
            list_devices,
            get_device_info,
            reboot_device,
            install_package,
            uninstall_package,
            list_fastboot_devices,
            wipe_data,
            flash_partition,
            get_fastboot_product,
            select_image_file,
            export_diagnostics_bundle
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
