pub const COUNT_DEFAULT_CB_FIRST: usize = 1;
pub const COUNT_DEFAULT_CB_LAST: usize = 16;
pub const COUNT_DEFAULT_UMI_FIRST: usize = 17;
pub const COUNT_DEFAULT_UMI_LAST: usize = 26;

pub const COUNT_DEFAULT_MAX_ERROR: u8 = 2;
pub const COUNT_DEFAULT_EXPECT_CELLS: usize = 0;

pub const COUNT_DEFAULT_UMI_COLLAPSING_DIST: u32 = 1;
pub const COUNT_DEFAULT_BC_COLLAPSING_DIST: u32 = 1;
pub const COUNT_DEFAULT_UMI_MIN_CLUSTER_SIZE: usize = 2;

pub const COUNT_DEFAULT_UNMAPPED_TAGS: usize = 100;

pub const COUNT_FILENAME_UNMAPPED: &str = "unmapped.csv";
