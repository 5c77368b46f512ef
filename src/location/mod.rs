mod resolver;

pub use resolver::{
    cache_key, choose_access_mode, file_url, input_file_name, input_location, media_input,
    resolve_address, resolve_thumbnail, AccessMode, AddressDescriptor, CacheKey,
    InputFileLocation, InputMediaDocument, ThumbnailPreview, Usage,
};
